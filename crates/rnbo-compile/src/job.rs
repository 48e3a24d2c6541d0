//! A single compile subprocess, placed in its own process group so it (and
//! anything it spawned, like a cmake sub-build) can be killed as a unit.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};

use rnbo_proto::error::CompileLoadError;

pub struct CompileJob {
    child: Child,
    pub source_path: PathBuf,
    pub library_name: String,
    pub expected_library_path: PathBuf,
    pub load_when_done: bool,
}

impl CompileJob {
    /// Spawns `exe source_path library_name rnbo_src_dir compile_cache_dir
    /// [cmake_path]` in a fresh process group.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        exe: &Path,
        source_path: PathBuf,
        library_name: String,
        rnbo_src_dir: &Path,
        compile_cache_dir: &Path,
        cmake_path: Option<&Path>,
        expected_library_path: PathBuf,
        load_when_done: bool,
    ) -> Result<Self, CompileLoadError> {
        use std::os::unix::process::CommandExt;

        let mut cmd = Command::new(exe);
        cmd.arg(&source_path)
            .arg(&library_name)
            .arg(rnbo_src_dir)
            .arg(compile_cache_dir);
        if let Some(cmake) = cmake_path {
            cmd.arg(cmake);
        }
        // Put the child in its own process group (pgid == its own pid) so a
        // cancel can signal the whole tree, not just this one process.
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| CompileLoadError::LoadFailed(format!("failed to spawn compiler: {e}")))?;

        Ok(Self {
            child,
            source_path,
            library_name,
            expected_library_path,
            load_when_done,
        })
    }

    /// Non-blocking. `None` while still running.
    pub fn poll(&mut self) -> Option<ExitStatus> {
        match self.child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                log::warn!("compile job wait failed: {}", e);
                None
            }
        }
    }

    /// Sends SIGTERM to the whole process group, not just the direct child.
    pub fn cancel(&mut self) {
        let pid = self.child.id() as i32;
        unsafe {
            libc::kill(-pid, libc::SIGTERM);
        }
    }
}

impl Drop for CompileJob {
    fn drop(&mut self) {
        if self.poll().is_none() {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_and_poll_a_trivial_command() {
        let mut job = CompileJob::spawn(
            Path::new("/bin/true"),
            PathBuf::from("src.cpp"),
            "lib".to_string(),
            Path::new("/tmp"),
            Path::new("/tmp"),
            None,
            PathBuf::from("/tmp/lib.so"),
            false,
        )
        .unwrap();

        let mut status = None;
        for _ in 0..100 {
            if let Some(s) = job.poll() {
                status = Some(s);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(status.unwrap().success());
    }

    #[test]
    fn cancel_terminates_a_long_running_job() {
        // coreutils `sleep` sums every numeric argument it's given, so this
        // spawns the equivalent of `sleep 30 0 0 0` -- a ~30s sleep -- using
        // the same four positional arguments a real compile invocation gets.
        let mut job = CompileJob::spawn(
            Path::new("/bin/sleep"),
            PathBuf::from("30"),
            "0".to_string(),
            Path::new("0"),
            Path::new("0"),
            None,
            PathBuf::from("/tmp/lib.so"),
            false,
        )
        .unwrap();

        assert!(job.poll().is_none());
        job.cancel();
        std::thread::sleep(std::time::Duration::from_millis(100));
        assert!(job.poll().is_some());
    }
}
