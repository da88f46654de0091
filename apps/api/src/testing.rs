//! In-memory fakes of the platform and AI transport for unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use bytes::Bytes;

use crate::ai::transport::{AiTransport, TransportError};
use crate::ai::types::{AiResponse, ChatRequest};
use crate::ai::AiClient;
use crate::platform::auth::KvSessionAuth;
use crate::platform::storage::unique_path;
use crate::platform::{
    FileStore, FsItem, KvStore, PdfRasterizer, PlatformContext, PlatformError, RasterizedImage,
};

pub const SAMPLE_FEEDBACK_JSON: &str = r#"{
    "overallScore": 72,
    "ATS": {"score": 80, "tips": [{"type": "good", "tip": "Standard headings"}]},
    "toneAndStyle": {"score": 65, "tips": [
        {"type": "improve", "tip": "Fewer buzzwords", "explanation": "Synergy appears 4 times."}
    ]},
    "content": {"score": 70, "tips": []},
    "structure": {"score": 75, "tips": []},
    "skills": {"score": 60, "tips": []}
}"#;

pub const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n%fake\n";

/// `*` matches any run of characters; everything else is literal.
fn glob_match(pattern: &str, key: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == key,
        Some((head, rest)) => {
            let Some(remaining) = key.strip_prefix(head) else {
                return false;
            };
            (0..=remaining.len())
                .filter(|i| remaining.is_char_boundary(*i))
                .any(|i| glob_match(rest, &remaining[i..]))
        }
    }
}

#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKv {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, PlatformError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, PlatformError> {
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, PlatformError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryFiles {
    files: Mutex<BTreeMap<String, Bytes>>,
    /// When set, uploads whose name ends with this suffix fail.
    fail_uploads_ending_with: Option<&'static str>,
    /// When set, deletes of paths ending with this suffix fail.
    fail_deletes_ending_with: Option<&'static str>,
}

impl MemoryFiles {
    pub fn failing_uploads_ending_with(suffix: &'static str) -> Self {
        Self {
            fail_uploads_ending_with: Some(suffix),
            ..Default::default()
        }
    }

    pub fn failing_deletes_ending_with(suffix: &'static str) -> Self {
        Self {
            fail_deletes_ending_with: Some(suffix),
            ..Default::default()
        }
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl FileStore for MemoryFiles {
    async fn upload(
        &self,
        dir: &str,
        file_name: &str,
        _content_type: &str,
        bytes: Bytes,
    ) -> Result<FsItem, PlatformError> {
        if let Some(suffix) = self.fail_uploads_ending_with {
            if file_name.ends_with(suffix) {
                return Err(PlatformError::Storage("disk full".to_string()));
            }
        }
        let path = unique_path(dir, file_name);
        let size = bytes.len() as u64;
        self.files.lock().unwrap().insert(path.clone(), bytes);
        Ok(FsItem {
            path,
            name: file_name.to_string(),
            size,
        })
    }

    async fn read(&self, path: &str) -> Result<Bytes, PlatformError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), PlatformError> {
        if let Some(suffix) = self.fail_deletes_ending_with {
            if path.ends_with(suffix) {
                return Err(PlatformError::Storage("permission denied".to_string()));
            }
        }
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}

/// Returns a fixed PNG, or fails when `fail` is set.
#[derive(Default)]
pub struct StubRasterizer {
    pub fail: bool,
}

#[async_trait]
impl PdfRasterizer for StubRasterizer {
    async fn first_page_png(
        &self,
        pdf_name: &str,
        _pdf: Bytes,
    ) -> Result<RasterizedImage, PlatformError> {
        if self.fail {
            return Err(PlatformError::Conversion("broken pdf".to_string()));
        }
        Ok(RasterizedImage {
            file_name: crate::platform::pdf::image_file_name(pdf_name),
            bytes: Bytes::from_static(b"\x89PNG\r\n"),
        })
    }
}

enum Script {
    SucceedOn(String),
    AlwaysFail(String),
    Reply(String),
}

/// Records every call; answers according to its script.
pub struct ScriptedTransport {
    script: Script,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every model except `model`, which answers with `SAMPLE_FEEDBACK_JSON`.
    pub fn succeed_on(model: &str) -> Self {
        Self::new(Script::SucceedOn(model.to_string()))
    }

    pub fn always_fail(message: &str) -> Self {
        Self::new(Script::AlwaysFail(message.to_string()))
    }

    /// The first model answers with `text`.
    pub fn reply_with(text: &str) -> Self {
        Self::new(Script::Reply(text.to_string()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AiTransport for ScriptedTransport {
    async fn send(&self, model: &str, request: &ChatRequest) -> Result<AiResponse, TransportError> {
        self.calls.lock().unwrap().push(model.to_string());
        self.requests.lock().unwrap().push(request.clone());

        let reply = |text: &str| AiResponse {
            model: model.to_string(),
            text: text.to_string(),
            usage: None,
        };
        match &self.script {
            Script::SucceedOn(target) if target == model => Ok(reply(SAMPLE_FEEDBACK_JSON)),
            Script::SucceedOn(_) => Err(TransportError::Api {
                status: 400,
                message: "invalid request".to_string(),
            }),
            Script::AlwaysFail(message) => Err(TransportError::Api {
                status: 429,
                message: message.clone(),
            }),
            Script::Reply(text) => Ok(reply(text)),
        }
    }
}

/// Handles on the fakes behind a test `PlatformContext`.
pub struct TestPlatform {
    pub context: PlatformContext,
    pub kv: Arc<MemoryKv>,
    pub files: Arc<MemoryFiles>,
    pub transport: Arc<ScriptedTransport>,
}

pub fn test_platform_with(
    transport: ScriptedTransport,
    files: MemoryFiles,
    rasterizer: StubRasterizer,
) -> TestPlatform {
    let kv = Arc::new(MemoryKv::default());
    let files = Arc::new(files);
    let transport = Arc::new(transport);
    let context = PlatformContext {
        auth: Arc::new(fast_session_auth(kv.clone())),
        fs: files.clone(),
        kv: kv.clone(),
        pdf: Arc::new(rasterizer),
        ai: AiClient::new(Some(transport.clone()), Duration::from_secs(30)),
    };
    TestPlatform {
        context,
        kv,
        files,
        transport,
    }
}

/// Session auth with the cheapest Argon2 parameters, so tests stay fast.
pub fn fast_session_auth(kv: Arc<dyn KvStore>) -> KvSessionAuth {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
    KvSessionAuth::with_hasher(kv, Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn test_platform() -> TestPlatform {
    test_platform_with(
        ScriptedTransport::reply_with(SAMPLE_FEEDBACK_JSON),
        MemoryFiles::default(),
        StubRasterizer::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::glob_match;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("resume:*", "resume:abc"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("user:*:resume:*", "user:1:resume:2"));
        assert!(!glob_match("resume:*", "session:abc"));
        assert!(!glob_match("exact", "exactly"));
    }
}
