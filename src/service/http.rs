//! ureq-backed client for a Custom Vision style training endpoint.
//!
//! Wire shapes follow the service's REST contract: tags come back as a
//! JSON array of `{id, name}` objects, batches go up as
//! `{images: [{name, contents, regions}]}` with base64 file contents,
//! and the batch response carries `isBatchSuccessful` plus per-image
//! statuses.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{AnnotationService, BatchSubmission, ImageStatus, ServiceError};
use crate::plan::UploadEntry;
use crate::region::{TagId, TagRegistry};

const API_ROOT: &str = "customvision/v3.3/training";
const CREDENTIAL_HEADER: &str = "Training-Key";

/// HTTP implementation of [`AnnotationService`].
pub struct HttpAnnotationService {
    agent: ureq::Agent,
    endpoint: String,
    credential: String,
}

impl HttpAnnotationService {
    /// Creates a client for the given endpoint and training key.
    pub fn new(endpoint: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credential: credential.into(),
        }
    }

    fn url(&self, project_id: &str, resource: &str) -> String {
        format!(
            "{}/{}/projects/{}/{}",
            self.endpoint, API_ROOT, project_id, resource
        )
    }
}

#[derive(Debug, Deserialize)]
struct TagWire {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegionWire<'a> {
    tag_id: &'a str,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Serialize)]
struct EntryWire<'a> {
    name: &'a str,
    contents: String,
    regions: Vec<RegionWire<'a>>,
}

#[derive(Debug, Serialize)]
struct BatchWire<'a> {
    images: Vec<EntryWire<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchResultWire {
    #[serde(default)]
    is_batch_successful: bool,
    #[serde(default)]
    images: Vec<ImageResultWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResultWire {
    #[serde(default)]
    status: String,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    image: Option<ImageWire>,
}

#[derive(Debug, Deserialize)]
struct ImageWire {
    #[serde(default)]
    name: Option<String>,
}

impl ImageResultWire {
    /// The service identifies images inconsistently across responses;
    /// prefer the created image's name, then the source URL.
    fn display_name(&self) -> String {
        self.image
            .as_ref()
            .and_then(|img| img.name.clone())
            .or_else(|| self.source_url.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn encode_batch(batch: &[UploadEntry]) -> BatchWire<'_> {
    BatchWire {
        images: batch
            .iter()
            .map(|entry| EntryWire {
                name: &entry.name,
                contents: BASE64.encode(&entry.contents),
                regions: entry
                    .regions
                    .iter()
                    .map(|region| RegionWire {
                        tag_id: region.tag_id.as_str(),
                        left: region.left,
                        top: region.top,
                        width: region.width,
                        height: region.height,
                    })
                    .collect(),
            })
            .collect(),
    }
}

impl AnnotationService for HttpAnnotationService {
    fn get_tags(&self, project_id: &str) -> Result<TagRegistry, ServiceError> {
        let url = self.url(project_id, "tags");
        let mut response = self
            .agent
            .get(&url)
            .header(CREDENTIAL_HEADER, &self.credential)
            .call()
            .map_err(|err| ServiceError::new(err.to_string()))?;

        let tags: Vec<TagWire> = response
            .body_mut()
            .read_json()
            .map_err(|err| ServiceError::new(format!("failed reading tag list: {err}")))?;

        Ok(TagRegistry::from_pairs(
            tags.into_iter().map(|tag| (tag.name, TagId(tag.id))),
        ))
    }

    fn submit_batch(
        &self,
        project_id: &str,
        batch: &[UploadEntry],
    ) -> Result<BatchSubmission, ServiceError> {
        let url = self.url(project_id, "images/files");
        let payload = encode_batch(batch);

        let mut response = self
            .agent
            .post(&url)
            .header(CREDENTIAL_HEADER, &self.credential)
            .send_json(&payload)
            .map_err(|err| ServiceError::new(err.to_string()))?;

        let result: BatchResultWire = response
            .body_mut()
            .read_json()
            .map_err(|err| ServiceError::new(format!("failed reading batch result: {err}")))?;

        Ok(BatchSubmission {
            is_batch_successful: result.is_batch_successful,
            images: result
                .images
                .iter()
                .map(|img| ImageStatus {
                    name: img.display_name(),
                    status: img.status.clone(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::ResolvedRegion;

    #[test]
    fn encodes_batch_with_base64_contents() {
        let entry = UploadEntry {
            name: "a.jpg".to_string(),
            contents: vec![0xFF, 0xD8, 0xFF],
            regions: vec![ResolvedRegion {
                tag_id: TagId::new("t-apple"),
                left: 0.1,
                top: 0.2,
                width: 0.3,
                height: 0.4,
            }],
        };

        let wire = encode_batch(std::slice::from_ref(&entry));
        let json = serde_json::to_value(&wire).unwrap();

        assert_eq!(json["images"][0]["name"], "a.jpg");
        assert_eq!(
            json["images"][0]["contents"],
            BASE64.encode([0xFFu8, 0xD8, 0xFF])
        );
        assert_eq!(json["images"][0]["regions"][0]["tagId"], "t-apple");
        assert_eq!(json["images"][0]["regions"][0]["left"], 0.1);
    }

    #[test]
    fn batch_result_wire_parses_service_response() {
        let result: BatchResultWire = serde_json::from_str(
            r#"{
                "isBatchSuccessful": false,
                "images": [
                    {"status": "OK", "image": {"name": "a.jpg"}},
                    {"status": "ErrorImageFormat", "sourceUrl": "b.jpg"},
                    {"status": "ErrorUnknown"}
                ]
            }"#,
        )
        .unwrap();

        assert!(!result.is_batch_successful);
        assert_eq!(result.images[0].display_name(), "a.jpg");
        assert_eq!(result.images[1].display_name(), "b.jpg");
        assert_eq!(result.images[2].display_name(), "unknown");
        assert_eq!(result.images[1].status, "ErrorImageFormat");
    }

    #[test]
    fn endpoint_trailing_slash_is_stripped() {
        let service = HttpAnnotationService::new("https://example.test/", "key");
        assert_eq!(
            service.url("proj-1", "tags"),
            "https://example.test/customvision/v3.3/training/projects/proj-1/tags"
        );
    }
}
