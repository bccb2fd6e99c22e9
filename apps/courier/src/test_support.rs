use std::path::{Path, PathBuf};

use crate::config::{AwsConfig, Config};

/// Config pointing at nothing real: store-backed tests swap in a
/// [`courier_store::MemoryStore`] and never touch the AWS section.
pub(crate) fn test_config(base: &Path) -> Config {
    Config {
        bucket_name: "courier-test".to_string(),
        status_csv_filename: "status.csv".to_string(),
        results_dir: base.join("results"),
        aws: AwsConfig {
            region: "us-east-1".to_string(),
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
            endpoint_url: None,
            force_path_style: false,
        },
        engine: None,
    }
}

/// Locates the filelist the latest upload run wrote under `results_dir`.
pub(crate) fn find_filelist(results_dir: &Path) -> PathBuf {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for run_dir in std::fs::read_dir(results_dir).unwrap() {
        let run_dir = run_dir.unwrap().path();
        if !run_dir.is_dir() {
            continue;
        }
        for entry in std::fs::read_dir(&run_dir).unwrap() {
            let path = entry.unwrap().path();
            let is_filelist = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("filelist-"));
            if is_filelist {
                candidates.push(path);
            }
        }
    }
    candidates.sort();
    candidates.pop().expect("no filelist written")
}

/// Writes an executable shell script posing as `olivepyworkflow`.
#[cfg(unix)]
pub(crate) fn fake_engine(dir: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake_olive.sh");
    std::fs::write(&script, body).unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();
    script.to_str().unwrap().to_string()
}
