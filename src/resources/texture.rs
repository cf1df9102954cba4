use std::path::PathBuf;

use crate::{
    config::BackgroundDescriptor,
    resources::{
        LoadFuture, Loader,
        binary::{AssetRoot, load_binary},
    },
};

pub const CUBE_FACES: usize = 6;

/// The six decoded faces of a skybox, ordered px, nx, py, ny, pz, nz.
#[derive(Clone, Debug)]
pub struct CubeTexture {
    pub name: String,
    pub faces: Vec<image::RgbaImage>,
}

impl CubeTexture {
    pub fn dimensions(&self) -> (u32, u32) {
        self.faces.first().map_or((0, 0), |face| face.dimensions())
    }
}

#[derive(Clone, Debug)]
pub struct CubeTextureLoader {
    assets: AssetRoot,
}

impl CubeTextureLoader {
    pub fn new(assets: AssetRoot) -> Self {
        Self { assets }
    }
}

impl Loader for CubeTextureLoader {
    type Source = BackgroundDescriptor;
    type Output = CubeTexture;

    fn load(&self, source: &BackgroundDescriptor) -> LoadFuture<CubeTexture> {
        let root = self.assets.path().to_path_buf();
        self.assets.spawn(load_cube_texture(root, source.clone()))
    }
}

pub async fn load_cube_texture(root: PathBuf, background: BackgroundDescriptor) -> anyhow::Result<CubeTexture> {
    if background.faces.len() != CUBE_FACES {
        anyhow::bail!(
            "background '{}' needs {} faces, got {}",
            background.name,
            CUBE_FACES,
            background.faces.len()
        );
    }
    let base = background.base_path.trim_end_matches('/');
    let mut faces = Vec::with_capacity(CUBE_FACES);
    for face in &background.faces {
        let file_name = if base.is_empty() {
            face.clone()
        } else {
            format!("{}/{}", base, face)
        };
        let bytes = load_binary(&root, &file_name).await?;
        faces.push(decode_face(&bytes)?);
    }
    let size = faces[0].dimensions();
    if let Some(face) = faces.iter().find(|face| face.dimensions() != size) {
        anyhow::bail!(
            "background '{}' mixes face sizes {:?} and {:?}",
            background.name,
            size,
            face.dimensions()
        );
    }
    Ok(CubeTexture {
        name: background.name,
        faces,
    })
}

pub fn decode_face(bytes: &[u8]) -> anyhow::Result<image::RgbaImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}
