use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: Option<String>,
}
