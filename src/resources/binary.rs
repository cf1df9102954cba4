use std::{
    future::Future,
    path::{Path, PathBuf},
};

use crate::resources::LoadFuture;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window available"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("window location has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Fetches `file_name` relative to the asset root.
///
/// Natively the root is a directory, on the web the `assets/` folder of the page origin.
pub async fn load_binary(root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let _ = root;
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = root.join(file_name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("can't read {}: {}", path.display(), e))?
    };

    Ok(data)
}

/// Resolves a path relative to the file that references it, e.g. a glTF buffer uri.
pub fn sibling(file_name: &str, relative: &str) -> String {
    match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, relative),
        None => relative.to_string(),
    }
}

/// Where loaders read from, plus the runtime their loads run on natively.
#[derive(Clone, Debug)]
pub struct AssetRoot {
    path: PathBuf,
    #[cfg(not(target_arch = "wasm32"))]
    runtime: tokio::runtime::Handle,
}

impl AssetRoot {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(path: impl Into<PathBuf>, runtime: tokio::runtime::Handle) -> Self {
        Self {
            path: path.into(),
            runtime,
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Starts `load` on the loader runtime, so it makes progress between frames.
    /// The returned future only waits for the result.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn<T: Send + 'static>(
        &self,
        load: impl Future<Output = anyhow::Result<T>> + Send + 'static,
    ) -> LoadFuture<T> {
        let handle = self.runtime.spawn(load);
        Box::pin(async move { Ok::<_, anyhow::Error>(handle.await??) })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn spawn<T: 'static>(&self, load: impl Future<Output = anyhow::Result<T>> + 'static) -> LoadFuture<T> {
        Box::pin(load)
    }
}
