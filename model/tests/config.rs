mod common;

use std::fs;
use std::path::PathBuf;

use common::Book;
use talkbook_model::{Media, Presentation, load_config};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("talkbook_model_test_{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_config(dir: &std::path::Path, root: &std::path::Path) -> PathBuf {
    let path = dir.join("book.toml");
    fs::write(
        &path,
        format!(
            "[presentation]\nname = \"Field guide\"\n\n\
             [storage]\nkind = \"filesystem\"\nroot = '{}'\ndata_dir = \"audio\"\n\n\
             [history]\nmax_undo = 10\n",
            root.display()
        ),
    )
    .unwrap();
    path
}

#[test]
fn filesystem_presentation_from_config_file() {
    let dir = temp_dir("filesystem");
    let root = dir.join("book");
    let config = load_config(&write_config(&dir, &root)).unwrap();
    assert_eq!(config.presentation.name, "Field guide");
    assert_eq!(config.max_undo(), Some(10));

    let mut book = Book::with_presentation(Presentation::new(config));
    let node = book.append(book.root());
    let clip = book.audio_clip(100);
    book.presentation
        .set_media(node, book.audio, Media::managed_audio(clip))
        .unwrap();

    let provider = book.presentation.media_data().get(clip).unwrap().used_data_providers()[0];
    let on_disk = book
        .presentation
        .data_providers()
        .absolute_path(provider)
        .unwrap()
        .unwrap();
    assert!(on_disk.starts_with(fs::canonicalize(root.join("audio")).unwrap()));
    assert_eq!(fs::read(&on_disk).unwrap(), common::pcm(100));

    book.presentation.detach(node).unwrap();
    let report = book.presentation.cleanup();
    assert_eq!(report.removed_data_providers, vec![provider]);
    assert!(report.failed_deletions.is_empty());
    assert!(!on_disk.exists());
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = temp_dir("missing");
    let err = load_config(&dir.join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}
