use super::*;
use chrono::TimeZone;
use std::fs;
use tempfile::TempDir;

fn fixed_timestamp() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_714_566_645_123)
        .single()
        .expect("valid timestamp")
}

#[test]
fn saves_image_bytes_to_specified_directory() {
    let dir = TempDir::new().expect("create temp directory");
    let options = SaveImageOptions {
        file_stem: "panel1",
        mime_type: None,
        output_dir: dir.path(),
    };

    let path = save_image_bytes(b"\x89PNG", options).expect("save image succeeds");
    assert_eq!(path, dir.path().join("panel1.png"));
    assert_eq!(fs::read(&path).expect("read saved image"), b"\x89PNG");
}

#[test]
fn saves_base64_image_with_mime_extension() {
    let dir = TempDir::new().expect("create temp directory");
    let options = SaveImageOptions {
        file_stem: "custom-name",
        mime_type: Some("image/jpeg"),
        output_dir: dir.path(),
    };

    let path = save_base64_image("aGVsbG8=", options).expect("save image succeeds");
    assert_eq!(path, dir.path().join("custom-name.jpg"));
    assert_eq!(fs::read(&path).expect("read saved image"), b"hello");
}

#[test]
fn empty_payload_is_rejected() {
    let dir = TempDir::new().expect("create temp directory");
    let options = SaveImageOptions {
        file_stem: "panel1",
        mime_type: None,
        output_dir: dir.path(),
    };
    let error = save_base64_image("  ", options).expect_err("empty payload");
    assert!(matches!(error, ImageSaveError::EmptyPayload));
}

#[test]
fn invalid_base64_is_rejected() {
    let dir = TempDir::new().expect("create temp directory");
    let options = SaveImageOptions {
        file_stem: "panel1",
        mime_type: None,
        output_dir: dir.path(),
    };
    let error = save_base64_image("not base64!", options).expect_err("decode fails");
    assert!(matches!(error, ImageSaveError::Decode(_)));
}

#[test]
fn run_output_creates_timestamped_directory() {
    let root = TempDir::new().expect("create temp directory");
    let run = RunOutput::create(&root.path().join("output"), fixed_timestamp())
        .expect("create run directory");

    let expected = root
        .path()
        .join("output")
        .join("run-2024-05-01T12-30-45-123Z");
    assert_eq!(run.dir(), expected.as_path());
    assert!(expected.is_dir());
}

#[test]
fn run_output_refuses_an_existing_directory() {
    let root = TempDir::new().expect("create temp directory");
    let first = RunOutput::create(root.path(), fixed_timestamp()).expect("first run");
    first.write_script("first").expect("write script");

    let error = RunOutput::create(root.path(), fixed_timestamp()).expect_err("second run");
    match error {
        ImageSaveError::Io { path, source } => {
            assert_eq!(path, first.dir());
            assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        fs::read_to_string(first.dir().join(SCRIPT_FILE_NAME)).expect("read script"),
        "first"
    );
}

#[test]
fn run_output_names_files() {
    let root = TempDir::new().expect("create temp directory");
    let run = RunOutput::create(root.path(), fixed_timestamp()).expect("create run directory");

    assert_eq!(RunOutput::panel_stem(2), "panel2");
    assert_eq!(run.captioned_path(2), run.dir().join("panel2_captioned.png"));
    assert_eq!(run.strip_path(), run.dir().join("final_comic_strip.png"));

    let script = run.write_script("Panel 1:\nScene: x\n").expect("write script");
    assert_eq!(script, run.dir().join("comic_script.txt"));
    assert_eq!(
        fs::read_to_string(script).expect("read script"),
        "Panel 1:\nScene: x\n"
    );
}

#[test]
fn unknown_mime_type_uses_bin_extension() {
    assert_eq!(extension_from_mime(Some("application/octet-stream")), "bin");
    assert_eq!(extension_from_mime(Some("IMAGE/WEBP")), "webp");
}
