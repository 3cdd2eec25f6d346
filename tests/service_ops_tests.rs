//! Tests for the file-management pass-throughs and boundary enforcement

use compio_fs_service::{
    FilePath, FileSystemService, ItemKind, ServiceConfig, ServiceError,
};
use std::fs;
use tempfile::TempDir;

/// Test existence checks distinguish presence from absence
#[compio::test]
async fn test_exists() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let file_path = temp_dir.path().join("here.txt");
    fs::write(&file_path, "x")?;

    let service = FileSystemService::standard();
    assert!(service.exists(&FilePath::new(&file_path)?).await?);
    assert!(
        !service
            .exists(&FilePath::new(temp_dir.path().join("gone"))?)
            .await?
    );
    Ok(())
}

/// Test metadata summaries for files and directories
#[compio::test]
async fn test_metadata() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let file_path = temp_dir.path().join("sized.bin");
    fs::write(&file_path, vec![0u8; 2048])?;

    let service = FileSystemService::standard();

    let file_meta = service.metadata(&FilePath::new(&file_path)?).await?;
    assert_eq!(file_meta.kind, ItemKind::File);
    assert_eq!(file_meta.len, 2048);
    assert!(file_meta.modified.is_some());

    let dir_meta = service
        .metadata(&FilePath::directory(temp_dir.path())?)
        .await?;
    assert_eq!(dir_meta.kind, ItemKind::Directory);
    Ok(())
}

/// Test metadata on a missing path is NotFound
#[compio::test]
async fn test_metadata_missing_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let service = FileSystemService::standard();
    let path = FilePath::new(temp_dir.path().join("absent")).unwrap();

    let result = service.metadata(&path).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

/// Test directory creation, recursive and not
#[compio::test]
async fn test_create_directory() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let service = FileSystemService::standard();

    let flat = FilePath::directory(temp_dir.path().join("flat"))?;
    service.create_directory(&flat, false).await?;
    assert!(flat.as_path().is_dir());

    // Non-recursive creation under a missing parent fails
    let orphan = FilePath::directory(temp_dir.path().join("missing/child"))?;
    assert!(service.create_directory(&orphan, false).await.is_err());

    // Recursive creation makes the parents
    service.create_directory(&orphan, true).await?;
    assert!(orphan.as_path().is_dir());

    // Recursive creation of an existing directory is not an error
    service.create_directory(&orphan, true).await?;
    Ok(())
}

/// Test file and directory removal
#[compio::test]
async fn test_removal() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let service = FileSystemService::standard();

    let file_path = temp_dir.path().join("doomed.txt");
    fs::write(&file_path, "x")?;
    service.remove_file(&FilePath::new(&file_path)?).await?;
    assert!(!file_path.exists());

    let dir_path = temp_dir.path().join("doomed-dir");
    fs::create_dir(&dir_path)?;
    fs::write(dir_path.join("inner.txt"), "x")?;
    let dir = FilePath::directory(&dir_path)?;

    // Non-recursive removal of a non-empty directory fails
    assert!(service.remove_directory(&dir, false).await.is_err());
    service.remove_directory(&dir, true).await?;
    assert!(!dir_path.exists());
    Ok(())
}

/// Test same-filesystem move
#[compio::test]
async fn test_move_item() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let src_path = temp_dir.path().join("from.txt");
    let dst_path = temp_dir.path().join("to.txt");
    fs::write(&src_path, "payload")?;

    let service = FileSystemService::standard();
    service
        .move_item(&FilePath::new(&src_path)?, &FilePath::new(&dst_path)?)
        .await?;

    assert!(!src_path.exists());
    assert_eq!(fs::read(&dst_path)?, b"payload");
    Ok(())
}

/// Test moving a missing source is NotFound
#[compio::test]
async fn test_move_missing_source() {
    let temp_dir = TempDir::new().unwrap();
    let service = FileSystemService::standard();
    let src = FilePath::new(temp_dir.path().join("absent")).unwrap();
    let dst = FilePath::new(temp_dir.path().join("target")).unwrap();

    let result = service.move_item(&src, &dst).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

/// Test path operation pass-throughs on the service
#[compio::test]
async fn test_path_passthroughs() -> anyhow::Result<()> {
    let service = FileSystemService::standard();

    let base = FilePath::directory("/srv/data")?;
    let joined = service.join_path(&base, "logs/app.log")?;
    assert_eq!(
        joined.as_path(),
        std::path::Path::new("/srv/data/logs/app.log")
    );

    let messy = FilePath::new("/srv/./data/../archive/file.txt")?;
    assert_eq!(
        service.normalize_path(&messy).as_path(),
        std::path::Path::new("/srv/archive/file.txt")
    );

    let (parent, name) = service.split_path(&joined);
    assert_eq!(
        parent.unwrap().as_path(),
        std::path::Path::new("/srv/data/logs")
    );
    assert_eq!(name.as_deref(), Some("app.log"));
    Ok(())
}

/// Test a bounded service anchors relative paths and runs real I/O
#[compio::test]
async fn test_bounded_service_anchors_relative_paths() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let service = FileSystemService::bounded(temp_dir.path())?;

    let relative = FilePath::new("nested/report.txt")?;
    service
        .create_directory(&FilePath::directory("nested")?, true)
        .await?;
    service.write_file(&relative, b"contained".to_vec()).await?;

    assert_eq!(
        fs::read(temp_dir.path().join("nested/report.txt"))?,
        b"contained"
    );
    Ok(())
}

/// Test a bounded service refuses escapes in both spellings
#[compio::test]
async fn test_bounded_service_refuses_escapes() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let service = FileSystemService::bounded(temp_dir.path())?;

    let upward = FilePath::new("ok/../../outside.txt")?;
    let result = service.write_file(&upward, b"x".to_vec()).await;
    assert!(matches!(result, Err(ServiceError::BoundaryViolation(_))));

    let absolute = FilePath::new("/etc/hosts")?;
    let result = service.read_file(&absolute).await;
    assert!(matches!(result, Err(ServiceError::BoundaryViolation(_))));
    Ok(())
}

/// Test configured chunk size is validated at service construction
#[compio::test]
async fn test_invalid_config_is_rejected() {
    let config = ServiceConfig {
        chunk_size: 1,
        ..ServiceConfig::default()
    };
    assert!(matches!(
        FileSystemService::new(config),
        Err(ServiceError::Config(_))
    ));
}
