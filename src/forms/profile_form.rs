use tracing::{debug, info};

use crate::error::{format_api_error, AppError, AppResult, FieldIssue};
use crate::forms::{check_length, required};
use crate::i18n;
use crate::models::{ProfileRequest, ProfileResponse, ProfileType};
use crate::services::http::RequestOptions;
use crate::services::profiles::ProfileService;

pub const DISPLAY_NAME_MIN: usize = 2;
pub const DISPLAY_NAME_MAX: usize = 200;
pub const LOCATION_MIN: usize = 2;
pub const LOCATION_MAX: usize = 255;

#[derive(Debug, Clone)]
pub struct ProfileForm {
    pub display_name: String,
    pub profile_type: Option<ProfileType>,
    /// Required for venues only.
    pub location: String,
    pub description: String,
    pub socials: Vec<String>,
    pub websites: Vec<String>,

    pub submitting: bool,
    pub error: Option<String>,
}

impl Default for ProfileForm {
    fn default() -> Self {
        ProfileForm {
            display_name: String::new(),
            profile_type: Some(ProfileType::Artist),
            location: String::new(),
            description: String::new(),
            socials: Vec::new(),
            websites: Vec::new(),
            submitting: false,
            error: None,
        }
    }
}

impl ProfileForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_social(&mut self) {
        self.socials.push(String::new());
    }

    pub fn set_social(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.socials.get_mut(index) {
            *slot = value.into();
        }
    }

    pub fn remove_social(&mut self, index: usize) {
        if index < self.socials.len() {
            self.socials.remove(index);
        }
    }

    pub fn add_website(&mut self) {
        self.websites.push(String::new());
    }

    pub fn set_website(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.websites.get_mut(index) {
            *slot = value.into();
        }
    }

    pub fn remove_website(&mut self, index: usize) {
        if index < self.websites.len() {
            self.websites.remove(index);
        }
    }

    pub fn is_venue(&self) -> bool {
        self.profile_type == Some(ProfileType::Venue)
    }

    pub fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        if let Some(issue) = check_length("displayName", &self.display_name, DISPLAY_NAME_MIN, DISPLAY_NAME_MAX) {
            issues.push(issue);
        }
        if self.profile_type.is_none() {
            issues.push(required("profileType"));
        }
        if self.is_venue() {
            if let Some(issue) = check_length("location", &self.location, LOCATION_MIN, LOCATION_MAX) {
                issues.push(issue);
            }
        }
        check_links("socials", &self.socials, &mut issues);
        check_links("websites", &self.websites, &mut issues);

        issues
    }

    /// Request body from the current values: trimmed, blanks dropped,
    /// location only for venues.
    pub fn to_request(&self) -> ProfileRequest {
        let description = self.description.trim();
        ProfileRequest {
            display_name: self.display_name.trim().to_string(),
            profile_type: self.profile_type,
            location: if self.is_venue() {
                Some(self.location.trim().to_string())
            } else {
                None
            },
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
            socials: clean_links(&self.socials),
            websites: clean_links(&self.websites),
        }
    }

    pub async fn submit(&mut self, profiles: &ProfileService) -> AppResult<ProfileResponse> {
        let issues = self.validate();
        if !issues.is_empty() {
            let err = AppError::Validation(issues);
            debug!("Profile form rejected locally: {}", err);
            self.error = Some(format_api_error(&err));
            return Err(err);
        }

        self.submitting = true;
        self.error = None;
        let result = profiles
            .create(&self.to_request(), RequestOptions::silent())
            .await;
        self.submitting = false;

        match result {
            Ok(profile) => {
                info!("Profile {} created", profile.id);
                Ok(profile)
            }
            Err(e) => {
                let message = format_api_error(&e);
                self.error = Some(if message.trim().is_empty() {
                    i18n::t("profile.create_failed")
                } else {
                    message
                });
                Err(e)
            }
        }
    }
}

fn check_links(field: &str, links: &[String], issues: &mut Vec<FieldIssue>) {
    for (i, link) in links.iter().enumerate() {
        // Checked as typed; surrounding whitespace is only stripped on submit.
        if !link.trim().is_empty() && !has_http_scheme(link) {
            let name = format!("{}[{}]", field, i);
            issues.push(FieldIssue::new(
                name.as_str(),
                i18n::t_with("validation.url_scheme", &[("field", name.as_str())]),
            ));
        }
    }
}

fn has_http_scheme(link: &str) -> bool {
    link.starts_with("http://") || link.starts_with("https://")
}

fn clean_links(links: &[String]) -> Vec<String> {
    links
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::signed_in_client;
    use serde_json::json;
    use wiremock::matchers::{any, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fields(issues: &[FieldIssue]) -> Vec<&str> {
        issues.iter().filter_map(|i| i.field.as_deref()).collect()
    }

    #[test]
    fn display_name_bounds_apply_after_trim() {
        let mut form = ProfileForm::new();
        form.display_name = "  A ".into();
        assert_eq!(fields(&form.validate()), vec!["displayName"]);
        form.display_name = "Ab".into();
        assert!(form.validate().is_empty());
        form.display_name = "x".repeat(201);
        assert_eq!(fields(&form.validate()), vec!["displayName"]);
    }

    #[test]
    fn location_required_only_for_venues() {
        let mut form = ProfileForm::new();
        form.display_name = "Club".into();
        form.profile_type = Some(ProfileType::Venue);
        assert_eq!(fields(&form.validate()), vec!["location"]);
        form.location = "B".into();
        assert_eq!(fields(&form.validate()), vec!["location"]);
        form.location = "Berlin".into();
        assert!(form.validate().is_empty());

        form.profile_type = None;
        assert_eq!(fields(&form.validate()), vec!["profileType"]);
    }

    #[test]
    fn links_need_http_scheme() {
        let mut form = ProfileForm::new();
        form.display_name = "Band".into();
        form.add_social();
        form.set_social(0, "instagram.com/band");
        form.add_website();
        form.set_website(0, "https://band.example");
        form.add_website();
        assert_eq!(fields(&form.validate()), vec!["socials[0]"]);

        form.remove_social(0);
        assert!(form.validate().is_empty());
    }

    #[test]
    fn scheme_check_runs_on_the_raw_link() {
        let mut form = ProfileForm::new();
        form.display_name = "Band".into();
        form.add_website();
        form.set_website(0, " https://band.example");
        form.add_website();
        form.set_website(1, "HTTPS://band.example");
        form.add_social();
        form.set_social(0, "   ");
        assert_eq!(fields(&form.validate()), vec!["websites[0]", "websites[1]"]);
    }

    #[test]
    fn request_is_trimmed() {
        let form = ProfileForm {
            display_name: "  Band  ".into(),
            profile_type: Some(ProfileType::Artist),
            location: "ignored".into(),
            description: "   ".into(),
            socials: vec![" https://s.example ".into(), "  ".into()],
            websites: vec![],
            ..Default::default()
        };
        let req = form.to_request();
        assert_eq!(req.display_name, "Band");
        assert_eq!(req.location, None);
        assert_eq!(req.description, None);
        assert_eq!(req.socials, vec!["https://s.example".to_string()]);
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_network() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let (api, _) = signed_in_client(&server.uri());
        let mut form = ProfileForm::new();
        let err = form.submit(&ProfileService::new(api)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(form.error.is_some());
    }

    #[tokio::test]
    async fn conflict_is_shown_inline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/profile/create"))
            .and(body_json(json!({
                "displayName": "Club",
                "profileType": "VENUE",
                "location": "Berlin",
                "socials": [],
                "websites": []
            })))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "status": 409, "message": "Profile already exists"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (api, memory) = signed_in_client(&server.uri());
        let mut form = ProfileForm {
            display_name: "Club".into(),
            profile_type: Some(ProfileType::Venue),
            location: " Berlin ".into(),
            ..Default::default()
        };
        let err = form.submit(&ProfileService::new(api)).await.unwrap_err();
        assert!(err.is_status(409));
        assert_eq!(form.error.as_deref(), Some("Profile already exists"));
        assert!(!form.submitting);
        assert!(memory.messages().await.is_empty());
    }
}
