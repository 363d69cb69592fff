//! Integration tests for filesystem photo loading.

use faceprofile_adapters::load_photo;
use faceprofile_core::normalize::{force_even_dimensions, resize_to_fit};
use faceprofile_test_support::SyntheticImageBuilder;
use image::GenericImageView;

#[test]
fn test_loaded_photo_flows_through_normalization() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("portrait.png");
    SyntheticImageBuilder::portrait(1200, 1600, 600.0, 500.0, 50.0)
        .save(&path)
        .expect("save png");

    let photo = load_photo(&path).expect("load");
    assert_eq!((photo.width, photo.height), (1200, 1600));

    let resized = resize_to_fit(&photo.image, 300, 400).expect("resize");
    assert_eq!(resized.dimensions(), (300, 400));

    let fixed = force_even_dimensions(resized);
    assert_eq!(fixed.dimensions(), (300, 400));
}

#[test]
fn test_odd_sized_photo_gets_even_working_copy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("odd.png");
    SyntheticImageBuilder::uniform_gray(999, 601, 128)
        .save(&path)
        .expect("save png");

    let photo = load_photo(&path).expect("load");
    let resized = resize_to_fit(&photo.image, 300, 400).expect("resize");
    // 999x601: ratio 1.662 > 0.75 -> width bound, height = round(300/1.662)
    assert_eq!(resized.dimensions(), (300, 180));

    let fixed = force_even_dimensions(resized);
    let (w, h) = fixed.dimensions();
    assert_eq!(w % 2, 0);
    assert_eq!(h % 2, 0);
}
