use std::{io::Cursor, path::PathBuf};

use explore_ngin::{
    config::BackgroundDescriptor,
    resources::{
        AssetId,
        texture::{decode_face, load_cube_texture},
    },
};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn sky(faces: &[&str]) -> BackgroundDescriptor {
    BackgroundDescriptor {
        id: AssetId(1),
        name: "sky".to_string(),
        base_path: "sky/".to_string(),
        faces: faces.iter().map(|face| face.to_string()).collect(),
    }
}

/// Writes six faces below a fresh temporary root; `odd` gets a different size.
fn faces_on_disk(test: &str, odd: Option<&str>) -> PathBuf {
    let root = std::env::temp_dir().join(format!("explore-ngin-{}-{}", test, std::process::id()));
    std::fs::create_dir_all(root.join("sky")).unwrap();
    for face in ["px", "nx", "py", "ny", "pz", "nz"] {
        let size = if odd == Some(face) { 8 } else { 4 };
        std::fs::write(root.join("sky").join(format!("{}.png", face)), png(size, size)).unwrap();
    }
    root
}

const FACES: [&str; 6] = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];

#[test]
fn decodes_faces_to_rgba() {
    let face = decode_face(&png(3, 2)).unwrap();
    assert_eq!(face.dimensions(), (3, 2));
    assert!(decode_face(b"not an image").is_err());
}

#[test]
fn loads_six_faces() {
    let root = faces_on_disk("six", None);
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let cube = runtime.block_on(load_cube_texture(root, sky(&FACES))).unwrap();
    assert_eq!(cube.faces.len(), 6);
    assert_eq!(cube.dimensions(), (4, 4));
    assert_eq!(cube.name, "sky");
}

#[test]
fn rejects_wrong_face_count_and_mixed_sizes() {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let root = faces_on_disk("count", None);
    assert!(runtime.block_on(load_cube_texture(root, sky(&FACES[..5]))).is_err());

    let root = faces_on_disk("mixed", Some("py"));
    assert!(runtime.block_on(load_cube_texture(root, sky(&FACES))).is_err());
}
