use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Result of writing one backup artifact.
/// `committed` is also true when the file was unchanged and already recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    pub path: PathBuf,
    pub committed: bool,
    pub pushed: bool,
}

/// Writes device configs into a Git working tree and records each change
pub struct BackupWriter {
    repo_path: PathBuf,
    commit_prefix: String,
    remote_url: Option<String>,
}

/// Make a name safe to use as a single path component
fn safe_component(value: &str) -> Result<String> {
    let safe = value.trim().replace(['/', '\\'], "_");
    if safe.is_empty() || safe == "." || safe == ".." {
        anyhow::bail!("invalid path component: {:?}", value);
    }
    Ok(safe)
}

impl BackupWriter {
    pub fn new(repo_path: impl Into<PathBuf>, commit_prefix: &str, remote_url: Option<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            commit_prefix: commit_prefix.to_string(),
            remote_url,
        }
    }

    /// Path of a device's backup relative to the repository root
    pub fn relative_path(&self, device_name: &str, manufacturer: &str, model: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(safe_component(manufacturer)?)
            .join(safe_component(model)?)
            .join(format!("{}.txt", safe_component(device_name)?)))
    }

    pub fn commit_message(&self, device_name: &str) -> String {
        format!("{} for {}", self.commit_prefix, device_name)
    }

    fn is_git_repo(&self) -> bool {
        self.repo_path.join(".git").exists()
    }

    /// Clone the remote into the repository path when no working tree exists yet
    pub async fn prepare(&self) {
        if self.is_git_repo() {
            return;
        }

        let Some(remote) = &self.remote_url else {
            tracing::warn!(
                "Backup path {} is not a Git repository and no remote is configured",
                self.repo_path.display()
            );
            return;
        };

        tracing::info!("Cloning backup repository {} into {}", remote, self.repo_path.display());
        let output = Command::new("git")
            .arg("clone")
            .arg(remote)
            .arg(&self.repo_path)
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {}
            Ok(out) => tracing::warn!(
                "Git clone failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            ),
            Err(e) => tracing::warn!("Git clone failed: {}", e),
        }
    }

    /// Write a device's configuration and commit + push it.
    /// Only the file write can fail this call; Git failures are logged and
    /// reported in the outcome, leaving the written file in place.
    pub async fn save(
        &self,
        device_name: &str,
        manufacturer: &str,
        model: &str,
        config: &str,
    ) -> Result<BackupOutcome> {
        let relative = self.relative_path(device_name, manufacturer, model)?;
        let file_path = self.repo_path.join(&relative);

        if let Some(folder) = file_path.parent() {
            tokio::fs::create_dir_all(folder)
                .await
                .with_context(|| format!("Failed to create {}", folder.display()))?;
        }

        tokio::fs::write(&file_path, config)
            .await
            .with_context(|| format!("Failed to write {}", file_path.display()))?;
        tracing::info!("Configuration for {} saved to {}.", device_name, file_path.display());

        let mut outcome = BackupOutcome {
            path: file_path,
            committed: false,
            pushed: false,
        };

        if !self.is_git_repo() {
            tracing::warn!(
                "Skipping Git commit for {}: {} is not a Git repository",
                device_name,
                self.repo_path.display()
            );
            return Ok(outcome);
        }

        let message = self.commit_message(device_name);
        if let Err(e) = self.commit(&relative, &message).await {
            tracing::warn!("Git operation failed: {}", e);
            return Ok(outcome);
        }
        outcome.committed = true;

        // Pushed even without a new commit, so an earlier failed push catches up
        match self.git(&["push", "origin", "HEAD"]).await {
            Ok(()) => {
                outcome.pushed = true;
                tracing::info!("Configuration for {} pushed to Git repository.", device_name);
            }
            Err(e) => tracing::warn!("Git operation failed: {}", e),
        }

        Ok(outcome)
    }

    async fn commit(&self, relative: &Path, message: &str) -> Result<()> {
        let relative = relative.to_string_lossy().into_owned();
        self.git(&["add", relative.as_str()]).await?;
        if !self.has_staged_changes().await? {
            tracing::info!("No changes to commit for {}", relative);
            return Ok(());
        }
        self.git(&["commit", "-m", message]).await
    }

    async fn has_staged_changes(&self) -> Result<bool> {
        let status = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(["diff", "--cached", "--quiet"])
            .status()
            .await
            .context("Failed to run git diff")?;

        match status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => anyhow::bail!("git diff exited with {}", status),
        }
    }

    /// Run a git subcommand inside the repository
    async fn git(&self, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            anyhow::bail!(
                "git {} exited with {}: {}",
                args.first().copied().unwrap_or_default(),
                output.status,
                detail.trim()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn git_available() -> bool {
        Command::new("git").arg("--version").output().await.is_ok()
    }

    #[tokio::test]
    async fn test_backup_path_layout() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BackupWriter::new(dir.path(), "Backup update", None);

        let outcome = writer.save("R1", "Cisco", "3725", "hostname R1\n!\nend\n").await.unwrap();

        let expected = dir.path().join("Cisco").join("3725").join("R1.txt");
        assert_eq!(outcome.path, expected);
        assert_eq!(std::fs::read_to_string(&expected).unwrap(), "hostname R1\n!\nend\n");
        assert!(!outcome.committed);
        assert!(!outcome.pushed);
    }

    #[tokio::test]
    async fn test_backup_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BackupWriter::new(dir.path(), "Backup update", None);

        writer.save("R1", "Cisco", "3725", "old").await.unwrap();
        let outcome = writer.save("R1", "Cisco", "3725", "new").await.unwrap();
        assert_eq!(std::fs::read_to_string(outcome.path).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_push_failure_keeps_file() {
        if !git_available().await {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let init = Command::new("git")
            .arg("init")
            .arg(dir.path())
            .output()
            .await
            .unwrap();
        assert!(init.status.success());

        // No remote configured, so the push step always fails
        let writer = BackupWriter::new(dir.path(), "Backup update", None);
        let outcome = writer.save("R1", "Cisco", "3725", "hostname R1\n").await.unwrap();

        assert!(!outcome.pushed);
        assert_eq!(std::fs::read_to_string(&outcome.path).unwrap(), "hostname R1\n");
    }

    async fn git_in(dir: &Path, args: &[&str]) {
        let out = Command::new("git").arg("-C").arg(dir).args(args).output().await.unwrap();
        assert!(out.status.success(), "git {:?}: {}", args, String::from_utf8_lossy(&out.stderr));
    }

    #[tokio::test]
    async fn test_unchanged_config_retries_failed_push() {
        if !git_available().await {
            return;
        }
        let remote = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        git_in(remote.path(), &["init", "--bare"]).await;
        git_in(work.path(), &["init"]).await;
        git_in(work.path(), &["config", "user.email", "backup@example.com"]).await;
        git_in(work.path(), &["config", "user.name", "Backup"]).await;
        let missing = work.path().join("no-such-remote");
        git_in(work.path(), &["remote", "add", "origin", missing.to_str().unwrap()]).await;

        let writer = BackupWriter::new(work.path(), "Backup update", None);
        let first = writer.save("R1", "Cisco", "3725", "hostname R1\n").await.unwrap();
        assert!(first.committed);
        assert!(!first.pushed);

        git_in(work.path(), &["remote", "set-url", "origin", remote.path().to_str().unwrap()]).await;
        let second = writer.save("R1", "Cisco", "3725", "hostname R1\n").await.unwrap();
        assert!(second.committed);
        assert!(second.pushed);

        let log = Command::new("git")
            .arg("--git-dir")
            .arg(remote.path())
            .args(["log", "--all", "--format=%s"])
            .output()
            .await
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&log.stdout).trim(), "Backup update for R1");
    }

    #[test]
    fn test_unsafe_components() {
        let writer = BackupWriter::new("/tmp/backup", "Backup update", None);
        assert_eq!(
            writer.relative_path("R1/a", "Cisco", "3725").unwrap(),
            PathBuf::from("Cisco/3725/R1_a.txt")
        );
        assert!(writer.relative_path("R1", "..", "3725").is_err());
        assert!(writer.relative_path("", "Cisco", "3725").is_err());
    }

    #[test]
    fn test_commit_message() {
        let writer = BackupWriter::new("/tmp/backup", "Backup update", None);
        assert_eq!(writer.commit_message("R1"), "Backup update for R1");
    }
}
