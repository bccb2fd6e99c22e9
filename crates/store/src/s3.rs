use std::future::Future;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;

use crate::{Error, ObjectStore, StoredObject};

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    /// Non-AWS endpoints (MinIO and compatible stores).
    pub endpoint_url: Option<String>,
    /// Path-style addressing, required by most non-AWS endpoints.
    pub force_path_style: bool,
}

#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn new(config: S3Config) -> Self {
        let credentials = Credentials::from_keys(
            config.access_key_id,
            config.secret_access_key,
            config.session_token,
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials);
        if let Some(endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ObjectStore for S3Store {
    fn get(&self, key: &str) -> impl Future<Output = Result<StoredObject, Error>> + Send {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let key = key.to_string();

        async move {
            let out = client.get_object().bucket(&bucket).key(&key).send().await;
            match out {
                Ok(out) => {
                    let etag = out.e_tag().map(str::to_string);
                    let bytes = out
                        .body
                        .collect()
                        .await
                        .map_err(|e| Error::Body(e.to_string()))?
                        .into_bytes()
                        .to_vec();
                    Ok(StoredObject { bytes, etag })
                }
                Err(err) => {
                    if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                        Err(Error::NotFound { key })
                    } else {
                        Err(service_error(err))
                    }
                }
            }
        }
    }

    fn put(&self, key: &str, bytes: Vec<u8>) -> impl Future<Output = Result<(), Error>> + Send {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let key = key.to_string();

        async move {
            client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .body(ByteStream::from(bytes))
                .send()
                .await
                .map(|_| ())
                .map_err(|err| classify_write(err, &key))
        }
    }

    fn put_if_match(
        &self,
        key: &str,
        bytes: Vec<u8>,
        etag: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let key = key.to_string();
        let etag = etag.to_string();

        async move {
            client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .body(ByteStream::from(bytes))
                .if_match(etag)
                .send()
                .await
                .map(|_| ())
                .map_err(|err| classify_write(err, &key))
        }
    }
}

fn classify_write<E>(err: SdkError<E>, key: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err.code() {
        Some("PreconditionFailed") => Error::PreconditionFailed {
            key: key.to_string(),
        },
        Some("NoSuchKey") => Error::NotFound {
            key: key.to_string(),
        },
        _ => service_error(err),
    }
}

fn service_error<E>(err: SdkError<E>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().unwrap_or("unknown").to_string();
    let message = match err.message() {
        Some(m) => m.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    Error::Service { code, message }
}
