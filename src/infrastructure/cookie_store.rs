//! Cookie 存储 - 基础设施层
//!
//! 以 TOML 文件保存名称 → 值，页面会话之间保留上次使用的学号

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, FileError};

/// 学号 Cookie 名称
pub const REGISTRATION_COOKIE: &str = "registrationNumber";

/// Cookie 文件
///
/// 克隆共享同一把写锁，读-改-写整个过程持锁。
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 读取 Cookie，文件不存在时视为空
    pub async fn get(&self, name: &str) -> AppResult<Option<String>> {
        let mut cookies = self.read_all().await?;
        Ok(cookies.remove(name))
    }

    /// 写入 Cookie，保留其他已有的 Cookie
    pub async fn set(&self, name: &str, value: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut cookies = self.read_all().await?;
        cookies.insert(name.to_string(), value.to_string());

        let path = self.path.display().to_string();
        let content = toml::to_string(&cookies).map_err(|source| {
            FileError::TomlSerializeFailed {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::file_write_failed(&path, e))?;

        debug!("Cookie {} 已写入 {}", name, path);
        Ok(())
    }

    async fn read_all(&self) -> AppResult<BTreeMap<String, String>> {
        let path = self.path.display().to_string();
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(AppError::file_read_failed(path, e)),
        };

        let cookies = toml::from_str(&content)
            .map_err(|source| FileError::TomlParseFailed { path, source })?;
        Ok(cookies)
    }
}

struct WriteRequest {
    name: String,
    value: String,
    done: Option<oneshot::Sender<AppResult<()>>>,
}

/// 按入队顺序写入 Cookie 的后台写入器
///
/// 入队是同步的，可以在回调或持有页面锁时调用；后入队的值一定后写入。
#[derive(Debug, Clone)]
pub struct CookieWriter {
    tx: mpsc::UnboundedSender<WriteRequest>,
}

/// 已入队、尚未确认的写入
pub struct PendingWrite {
    done: oneshot::Receiver<AppResult<()>>,
}

impl PendingWrite {
    /// 等待写入完成
    pub async fn wait(self) -> AppResult<()> {
        self.done.await.unwrap_or_else(|_| Err(writer_closed()))
    }
}

impl CookieWriter {
    /// 在给定运行时上启动写入任务
    pub fn spawn(store: CookieStore, runtime: &Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteRequest>();
        runtime.spawn(async move {
            while let Some(request) = rx.recv().await {
                let result = store.set(&request.name, &request.value).await;
                match request.done {
                    Some(done) => {
                        let _ = done.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            warn!("写入 Cookie {} 失败: {}", request.name, e);
                        }
                    }
                }
            }
        });
        Self { tx }
    }

    /// 入队，不等待结果
    pub fn enqueue(&self, name: &str, value: &str) -> AppResult<()> {
        self.send(name, value, None)
    }

    /// 入队，返回可等待的写入结果
    pub fn write(&self, name: &str, value: &str) -> AppResult<PendingWrite> {
        let (done, rx) = oneshot::channel();
        self.send(name, value, Some(done))?;
        Ok(PendingWrite { done: rx })
    }

    fn send(
        &self,
        name: &str,
        value: &str,
        done: Option<oneshot::Sender<AppResult<()>>>,
    ) -> AppResult<()> {
        self.tx
            .send(WriteRequest {
                name: name.to_string(),
                value: value.to_string(),
                done,
            })
            .map_err(|_| writer_closed())
    }
}

fn writer_closed() -> AppError {
    AppError::Other("Cookie 写入器已关闭".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("cookies.toml"));
        assert_eq!(store.get(REGISTRATION_COOKIE).await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_keeps_other_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("cookies.toml"));

        store.set("theme", "dark").await.unwrap();
        store.set(REGISTRATION_COOKIE, "123456").await.unwrap();
        store.set(REGISTRATION_COOKIE, "654321").await.unwrap();

        assert_eq!(
            store.get(REGISTRATION_COOKIE).await.unwrap().as_deref(),
            Some("654321")
        );
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sets_keep_every_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("cookies.toml"));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set(&format!("c{}", i), "v").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        for i in 0..16 {
            assert_eq!(
                store.get(&format!("c{}", i)).await.unwrap().as_deref(),
                Some("v")
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn writer_applies_writes_in_enqueue_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().join("cookies.toml"));
        let writer = CookieWriter::spawn(store.clone(), &Handle::current());

        for i in 0..50 {
            writer
                .enqueue(REGISTRATION_COOKIE, &i.to_string())
                .unwrap();
        }
        writer
            .write(REGISTRATION_COOKIE, "last")
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert_eq!(
            store.get(REGISTRATION_COOKIE).await.unwrap().as_deref(),
            Some("last")
        );
    }
}
