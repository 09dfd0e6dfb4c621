use super::{render_project_file, ProjectWorkspace};
use crate::config::{SessionConfig, SessionLayout};
use crate::error::SessionError;
use std::fs;

fn layout_in(root: &std::path::Path) -> SessionLayout {
    SessionLayout::new(root.to_path_buf(), SessionConfig::default())
}

#[test]
fn project_file_points_at_the_source_copy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let text = render_project_file(&layout_in(dir.path()));
    assert!(text.contains("with \"sparklib_common\";\n"));
    assert!(text.contains("project sparklib_gen is\n"));
    assert!(text.contains("for Source_Dirs use (\"src2\", \"src2/full\");"));
    assert!(text.contains("for Object_Dir use \"obj2\";"));
    assert!(text.contains("for Proof_Dir use \"proof\";"));
    assert!(text.trim_end().ends_with("end sparklib_gen;"));
}

#[test]
fn prepare_transforms_copy_and_drop_cleans_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("full")).expect("mkdir");
    let original = "package P with SPARK_Mode => Off --  #BODYMODE\nis\nend P;\n";
    fs::write(src.join("full/p.ads"), original).expect("write");

    let layout = layout_in(dir.path());
    {
        let workspace = ProjectWorkspace::prepare(&layout, false).expect("prepare");
        assert!(workspace.project_file().is_file());
        let copy = fs::read_to_string(workspace.staging_dir().join("full/p.ads")).expect("read");
        assert!(copy.contains("SPARK_Mode => On --  #BODYMODE"));
        assert_eq!(
            fs::read_to_string(src.join("full/p.ads")).expect("read"),
            original
        );
    }
    assert!(!layout.project_file().exists());
    assert!(!layout.staging_source_dir().exists());
}

#[test]
fn keep_leaves_workspace_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("src")).expect("mkdir");
    let layout = layout_in(dir.path());
    drop(ProjectWorkspace::prepare(&layout, true).expect("prepare"));
    assert!(layout.project_file().is_file());
    assert!(layout.staging_source_dir().is_dir());
}

#[test]
fn existing_copy_is_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("src")).expect("mkdir");
    fs::create_dir_all(dir.path().join("src2")).expect("mkdir");
    let err = ProjectWorkspace::prepare(&layout_in(dir.path()), false).expect_err("occupied");
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::WorkspaceOccupied { .. })
    ));
    assert!(dir.path().join("src2").is_dir());
}

#[test]
fn missing_source_tree_is_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = layout_in(dir.path());
    let err = ProjectWorkspace::prepare(&layout, false).expect_err("no sources");
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::MissingFile { .. })
    ));
    assert!(!layout.project_file().exists());
}
