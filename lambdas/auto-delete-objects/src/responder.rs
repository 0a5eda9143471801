use async_trait::async_trait;
use derive_new::new;
use lambda_runtime::Error;

use crate::request::CustomResourceResponse;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub(crate) trait Responder: Send + Sync {
    async fn respond(&self, url: &str, response: &CustomResourceResponse) -> Result<(), Error>;
}

#[derive(Clone, Debug, new)]
pub(crate) struct HttpResponder {
    http_client: reqwest::Client,
}

#[async_trait]
impl Responder for HttpResponder {
    async fn respond(&self, url: &str, response: &CustomResourceResponse) -> Result<(), Error> {
        let body = serde_json::to_string(response)?;

        // The presigned URL is signed without a content type.
        self.http_client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "")
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
