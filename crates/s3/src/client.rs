//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from bkt-core.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_smithy_types::byte_stream::ByteStream;
use futures::stream;

use bkt_core::{
    Error, ListOptions, ListResult, ObjectBody, ObjectInfo, ObjectStore, Result, StoreConfig,
};

/// Error codes that mean the key or bucket does not exist
const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NoSuchBucket", "NotFound"];

/// Error codes that mean the credentials were rejected
const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
];

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from a store configuration
    ///
    /// Credentials are static; nothing is sent to the store until the first
    /// request.
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None, // session token
            None, // expiry
            "bkt-static-credentials",
        );

        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(config.timeout)
            .build();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()))
            .timeout_config(timeouts);
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        // Custom endpoints are usually S3-compatible servers without
        // virtual-host bucket routing.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        tracing::debug!(
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }
}

/// Map an SDK failure onto the bkt error taxonomy
fn map_sdk_error<E, R>(err: SdkError<E, R>, target: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let detail = DisplayErrorContext(&err).to_string();
    classify(code.as_deref(), target, detail)
}

fn classify(code: Option<&str>, target: &str, detail: String) -> Error {
    match code {
        Some(code) if NOT_FOUND_CODES.contains(&code) => Error::NotFound(target.to_string()),
        Some(code) if AUTH_CODES.contains(&code) => Error::Auth(format!("{target}: {code}")),
        _ => Error::StoreUnavailable(detail),
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult> {
        let mut request = self.inner.list_objects_v2().bucket(bucket);

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        tracing::debug!(bucket, token = ?options.continuation_token, "ListObjectsV2");
        let response = request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, bucket))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let key = object.key().unwrap_or_default();
                let size = object.size().unwrap_or(0).max(0) as u64;
                let mut info = ObjectInfo::new(key, size);

                if let Some(modified) = object.last_modified() {
                    info.last_modified = jiff::Timestamp::from_second(modified.secs()).ok();
                }

                if let Some(etag) = object.e_tag() {
                    info.etag = Some(etag.trim_matches('"').to_string());
                }

                info
            })
            .collect();

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        tracing::debug!(bucket, key, "GetObject");
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

        let content_length = response
            .content_length()
            .and_then(|len| u64::try_from(len).ok());

        let chunks = stream::unfold(response.body, |mut body| async move {
            match body.next().await {
                Some(Ok(bytes)) => Some((Ok(bytes.to_vec()), body)),
                Some(Err(e)) => Some((
                    Err(Error::StoreUnavailable(format!("failed to read body: {e}"))),
                    body,
                )),
                None => None,
            }
        });

        Ok(ObjectBody {
            content_length,
            chunks: Box::pin(chunks),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<ObjectInfo> {
        let size = data.len() as u64;
        tracing::debug!(bucket, key, size, "PutObject");

        let response = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

        let mut info = ObjectInfo::new(key, size);
        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        tracing::debug!(bucket, key, "DeleteObject");
        match self.inner.delete_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(()),
            Err(e) if already_deleted(e.code()) => Ok(()),
            Err(e) => Err(map_sdk_error(e, &format!("{bucket}/{key}"))),
        }
    }
}

/// Some S3-compatible servers answer DeleteObject on a missing key with
/// `NoSuchKey` instead of 204
fn already_deleted(code: Option<&str>) -> bool {
    code == Some("NoSuchKey")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(endpoint: Option<&str>) -> StoreConfig {
        StoreConfig {
            access_key: "AKID".into(),
            secret_key: "secret".into(),
            region: "eu-west-1".into(),
            bucket: "bucket".into(),
            endpoint: endpoint.map(str::to_string),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify(Some("NoSuchKey"), "bucket/a.txt", "detail".into());
        assert!(matches!(err, Error::NotFound(ref t) if t == "bucket/a.txt"));
    }

    #[test]
    fn test_classify_auth() {
        let err = classify(Some("InvalidAccessKeyId"), "bucket", "detail".into());
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_classify_transport_without_code() {
        let err = classify(None, "bucket", "dispatch failure: timeout".into());
        assert!(matches!(err, Error::StoreUnavailable(ref d) if d.contains("timeout")));
    }

    #[test]
    fn test_delete_of_missing_key_is_success() {
        assert!(already_deleted(Some("NoSuchKey")));
        assert!(!already_deleted(Some("NoSuchBucket")));
        assert!(!already_deleted(Some("AccessDenied")));
        assert!(!already_deleted(None));
    }

    #[tokio::test]
    async fn test_client_builds_without_contacting_store() {
        let client = S3Client::new(&config(Some("http://127.0.0.1:9000"))).await;
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_client_rejects_invalid_config() {
        let mut bad = config(None);
        bad.bucket = String::new();
        assert!(matches!(
            S3Client::new(&bad).await,
            Err(Error::Config(_))
        ));
    }
}
