//! The compile state machine: at most one job exists. A new request cancels
//! whatever is in flight before starting the new one.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rnbo_proto::error::CompileLoadError;

use crate::job::CompileJob;

#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub library_name: String,
    pub library_path: PathBuf,
    pub source_path: PathBuf,
    pub load_when_done: bool,
    pub success: bool,
}

#[derive(Default)]
pub struct CompileSupervisor {
    current: Mutex<Option<CompileJob>>,
}

impl CompileSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }

    /// Cancels any in-flight job, then spawns the new one.
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &self,
        exe: &Path,
        source_path: PathBuf,
        library_name: String,
        rnbo_src_dir: &Path,
        compile_cache_dir: &Path,
        cmake_path: Option<&Path>,
        expected_library_path: PathBuf,
        load_when_done: bool,
    ) -> Result<(), CompileLoadError> {
        let mut current = self.current.lock().unwrap();
        if let Some(mut job) = current.take() {
            log::info!("cancelling in-flight compile job for {}", job.library_name);
            job.cancel();
        }

        let job = CompileJob::spawn(
            exe,
            source_path,
            library_name,
            rnbo_src_dir,
            compile_cache_dir,
            cmake_path,
            expected_library_path,
            load_when_done,
        )?;
        *current = Some(job);
        Ok(())
    }

    pub fn cancel(&self) {
        if let Some(mut job) = self.current.lock().unwrap().take() {
            job.cancel();
        }
    }

    /// Polls the in-flight job, if any. Once it exits, the job is removed
    /// from `current` and an outcome is returned: success requires both exit
    /// code 0 and the expected library actually existing on disk.
    pub fn poll_once(&self) -> Option<CompileOutcome> {
        let mut current = self.current.lock().unwrap();
        let exited = {
            let job = current.as_mut()?;
            job.poll()
        }?;

        let job = current.take().unwrap();
        let success = exited.success() && job.expected_library_path.exists();
        Some(CompileOutcome {
            library_name: job.library_name,
            library_path: job.expected_library_path,
            source_path: job.source_path,
            load_when_done: job.load_when_done,
            success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitting_while_busy_cancels_the_previous_job() {
        let sup = CompileSupervisor::new();
        sup.submit(
            Path::new("/bin/sleep"),
            PathBuf::from("30"),
            "a".to_string(),
            Path::new("0"),
            Path::new("0"),
            None,
            PathBuf::from("/tmp/a.so"),
            false,
        )
        .unwrap();
        assert!(sup.is_busy());

        sup.submit(
            Path::new("/bin/true"),
            PathBuf::from("x"),
            "b".to_string(),
            Path::new("0"),
            Path::new("0"),
            None,
            PathBuf::from("/tmp/b.so"),
            false,
        )
        .unwrap();

        let mut outcome = None;
        for _ in 0..100 {
            if let Some(o) = sup.poll_once() {
                outcome = Some(o);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(outcome.unwrap().library_name, "b");
    }

    #[test]
    fn outcome_is_failure_when_library_never_appears() {
        let sup = CompileSupervisor::new();
        sup.submit(
            Path::new("/bin/true"),
            PathBuf::from("x"),
            "c".to_string(),
            Path::new("0"),
            Path::new("0"),
            None,
            PathBuf::from("/nonexistent/path/c.so"),
            false,
        )
        .unwrap();

        let mut outcome = None;
        for _ in 0..100 {
            if let Some(o) = sup.poll_once() {
                outcome = Some(o);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(!outcome.unwrap().success);
    }
}
