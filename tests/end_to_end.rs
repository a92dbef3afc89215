//! End-to-end tests against the real `RustBackend`.
//!
//! Each test writes a synthetic JPEG into a temp directory, resamples it
//! through the public API and checks the derived files and the markup.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageEncoder, RgbImage};
use respimg::facade::Responsive;
use respimg::imaging::{
    OriginalImage, Quality, ResampleTarget, ResizeMethod, RustBackend, SourceImage, Tier,
    pregenerate_variants,
};
use respimg::render;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let file = std::fs::File::create(path).unwrap();
    image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// `site/lenna.jpg` at 485x328, resampled into `site/_resampled`.
fn lenna_site() -> (TempDir, PathBuf, ResampleTarget) {
    let tmp = TempDir::new().unwrap();
    let image = tmp.path().join("site/lenna.jpg");
    write_jpeg(&image, 485, 328);
    let target = ResampleTarget {
        dir: tmp.path().join("site/_resampled"),
        base_url: "/_resampled".to_string(),
    };
    (tmp, image, target)
}

fn open<'b>(backend: &'b RustBackend, image: &Path, target: ResampleTarget) -> SourceImage<'b> {
    SourceImage::open(backend, image, target, Quality::default())
        .unwrap()
        .with_url("/lenna.jpg")
        .with_title("Lenna")
}

fn data_uri(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
}

fn size_of(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

#[test]
fn tag_for_intrinsic_size() {
    let (_tmp, image, target) = lenna_site();
    let dir = target.dir.clone();
    let backend = RustBackend::new();
    let original = open(&backend, &image, target);
    let responsive = Responsive::new(&backend, Default::default(), &original);

    let html = responsive.tag().expect("tag renders");

    assert!(html.contains(r#"src="/_resampled/SetWidth121x82-lenna.jpg""#));
    assert!(html.contains(
        "/_resampled/SetWidth121x82-lenna.jpg 121w, \
         /_resampled/SetWidth243x164-lenna.jpg 243w, \
         /lenna.jpg 485w"
    ));
    assert!(html.contains(r#"width="485""#));
    assert!(html.contains(r#"height="328""#));
    assert!(html.contains(r#"alt="Lenna""#));
    assert!(html.contains("background-image: url(data:image/jpeg;base64,"));

    assert_eq!(size_of(&dir.join("SetWidth121x82-lenna.jpg")).0, 121);
    assert_eq!(size_of(&dir.join("SetWidth243x164-lenna.jpg")).0, 243);
    assert!(dir.join("SetWidth60x41-lenna.jpg").exists());
    assert!(dir.join("Blur8-SetWidth60x41-lenna.jpg").exists());
    // The large tier is the original itself
    assert!(!dir.join("SetWidth485x328-lenna.jpg").exists());
}

#[test]
fn cropped_placement_produces_exact_boxes() {
    let (_tmp, image, target) = lenna_site();
    let dir = target.dir.clone();
    let backend = RustBackend::new();
    let original = open(&backend, &image, target);
    let mut responsive = Responsive::new(&backend, Default::default(), &original);
    responsive.size(ResizeMethod::CroppedImage, Some(320), Some(200));

    assert_eq!(
        responsive.source(Tier::Large).unwrap().as_deref(),
        Some("/_resampled/CroppedImage320x200-lenna.jpg")
    );
    assert_eq!(
        size_of(&dir.join("CroppedImage320x200-lenna.jpg")),
        (320, 200)
    );

    responsive.tag().expect("tag renders");
    assert_eq!(size_of(&dir.join("CroppedImage160x100-lenna.jpg")), (160, 100));
    assert_eq!(size_of(&dir.join("CroppedImage80x50-lenna.jpg")), (80, 50));
    assert_eq!(size_of(&dir.join("CroppedImage40x25-lenna.jpg")), (40, 25));
}

#[test]
fn placeholder_is_blurred_and_inlined() {
    let (_tmp, image, target) = lenna_site();
    let backend = RustBackend::new();
    let original = open(&backend, &image, target);
    let responsive = Responsive::new(&backend, Default::default(), &original);

    let url = responsive.tiny_blurred_source().unwrap();
    assert_eq!(url.as_deref(), Some("/_resampled/Blur8-SetWidth60x41-lenna.jpg"));

    let uri = responsive.tiny_blurred_data_uri().unwrap().unwrap();
    assert!(uri.starts_with("data:image/jpeg;base64,"));
    // Cached: asking again gives the same bytes
    assert_eq!(responsive.tiny_blurred_data_uri().unwrap().unwrap(), uri);

    let attrs = responsive.tiny_source_attributes().unwrap().unwrap();
    assert!(attrs.starts_with(r#"style="background-image: url(data:image/jpeg;base64,"#));
    assert!(attrs.ends_with(r#"background-repeat: no-repeat; background-size: cover;""#));
}

#[test]
fn pregenerate_reuses_existing_files() {
    let (_tmp, image, target) = lenna_site();
    let backend = RustBackend::new();
    let original = open(&backend, &image, target);
    let responsive = Responsive::new(&backend, Default::default(), &original);
    let dims = responsive.dimensions().unwrap();

    let first = pregenerate_variants(&original, &dims, ResizeMethod::SetWidth);
    assert_eq!(first.len(), 3);
    assert!(first.iter().all(|tv| tv.result.as_ref().unwrap().created));

    let second = pregenerate_variants(&original, &dims, ResizeMethod::SetWidth);
    assert!(second.iter().all(|tv| !tv.result.as_ref().unwrap().created));
}

#[test]
fn pregenerate_leaves_intrinsic_large_to_the_original() {
    let (_tmp, image, target) = lenna_site();
    let dir = target.dir.clone();
    let backend = RustBackend::new();
    let original = open(&backend, &image, target);
    let responsive = Responsive::new(&backend, Default::default(), &original);
    let dims = responsive.dimensions().unwrap();

    let results = pregenerate_variants(&original, &dims, ResizeMethod::SetWidth);

    assert!(results.iter().all(|tv| tv.tier != Tier::Large));
    assert!(!dir.join("SetWidth485x328-lenna.jpg").exists());
    assert_eq!(
        responsive.source(Tier::Large).unwrap().as_deref(),
        Some("/lenna.jpg")
    );
}

#[test]
fn pregenerated_tiny_still_gets_a_blurred_placeholder() {
    let (_tmp, image, target) = lenna_site();
    let dir = target.dir.clone();
    let backend = RustBackend::new();
    let original = open(&backend, &image, target);

    let dims = Responsive::new(&backend, Default::default(), &original)
        .dimensions()
        .unwrap();
    pregenerate_variants(&original, &dims, ResizeMethod::SetWidth);
    let sharp = std::fs::read(dir.join("SetWidth60x41-lenna.jpg")).unwrap();

    // A later render finds the sharp tiny file already on disk
    let responsive = Responsive::new(&backend, Default::default(), &original);
    let uri = responsive.tiny_blurred_data_uri().unwrap().unwrap();

    let blurred = std::fs::read(dir.join("Blur8-SetWidth60x41-lenna.jpg")).unwrap();
    assert_ne!(blurred, sharp);
    assert_eq!(uri, data_uri(&blurred));
    assert_ne!(uri, data_uri(&sharp));
    // The sharp tier file is left as it was
    assert_eq!(std::fs::read(dir.join("SetWidth60x41-lenna.jpg")).unwrap(), sharp);
}

#[test]
fn concurrent_renders_share_one_blurred_placeholder() {
    let (_tmp, image, target) = lenna_site();
    let dir = target.dir.clone();
    let backend = RustBackend::new();
    let original = open(&backend, &image, target);

    let uris: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    Responsive::new(&backend, Default::default(), &original)
                        .tiny_blurred_data_uri()
                        .unwrap()
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let blurred = std::fs::read(dir.join("Blur8-SetWidth60x41-lenna.jpg")).unwrap();
    assert!(uris.iter().all(|uri| *uri == data_uri(&blurred)));
    let sharp = std::fs::read(dir.join("SetWidth60x41-lenna.jpg")).unwrap();
    assert_ne!(blurred, sharp);
}

#[test]
fn height_method_reads_lone_width_as_height() {
    let (_tmp, image, target) = lenna_site();
    let backend = RustBackend::new();
    let original = open(&backend, &image, target);
    let mut responsive = Responsive::new(&backend, Default::default(), &original);
    responsive.size(ResizeMethod::SetHeight, Some(200), None);

    let url = responsive.source(Tier::Medium).unwrap().unwrap();
    assert!(url.starts_with("/_resampled/SetHeight"), "got {url}");
    assert_eq!(responsive.width().unwrap(), original.width());
}

#[test]
fn missing_original_file_fails_to_open() {
    let tmp = TempDir::new().unwrap();
    let backend = RustBackend::new();
    let target = ResampleTarget {
        dir: tmp.path().join("_resampled"),
        base_url: String::new(),
    };
    let result = SourceImage::open(
        &backend,
        &tmp.path().join("nope.jpg"),
        target,
        Quality::default(),
    );
    assert!(result.is_err());
}

#[test]
fn open_tag_never_carries_source_comments() {
    let (_tmp, image, target) = lenna_site();
    let backend = RustBackend::new();
    let original = open(&backend, &image, target);
    let mut responsive = Responsive::new(&backend, Default::default(), &original);
    responsive.extra_classes("hero");

    render::set_source_file_comments(true);
    let open_tag = responsive.open_tag();
    let tag = responsive.tag();
    render::set_source_file_comments(false);

    let open_tag = open_tag.unwrap();
    assert!(open_tag.starts_with("<div"));
    assert!(!open_tag.contains("<!--"));
    assert!(open_tag.contains(r#"class="responsive-image hero""#));
    assert!(tag.unwrap().starts_with("<!-- template ResponsiveImageTag -->"));
    assert!(!render::source_file_comments());
}
