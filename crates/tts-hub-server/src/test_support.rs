use std::path::PathBuf;

/// Fresh directory under the system temp dir, unique per call.
pub(crate) fn temp_root(tag: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!(
        "tts-hub-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&root).expect("create temp dir");
    root
}
