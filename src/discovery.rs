use anyhow::Result;
use futures::stream::{Stream, StreamExt};
use glob::glob;
use std::collections::VecDeque;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

/// Configuration for input discovery behavior
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Whether to fail on the first unusable input or report it and continue
    pub fail_fast: bool,
}

/// One input path and whether it can be read
#[derive(Debug, Clone)]
pub struct InputValidation {
    pub path: PathBuf,
    pub error: Option<String>,
}

impl InputValidation {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// True when the argument contains glob metacharacters
pub fn is_glob_pattern(argument: &str) -> bool {
    argument.contains(&['*', '?', '['][..])
}

/// Expands input arguments (literal paths or glob patterns) into validated paths,
/// in argument order. Paths matched by one pattern come back sorted.
pub fn discover_inputs(
    arguments: Vec<String>,
    config: DiscoveryConfig,
) -> impl Stream<Item = Result<InputValidation>> {
    futures::stream::unfold(DiscoveryState::new(arguments, config), |mut state| async move {
        state.next_input().await.map(|result| (result, state))
    })
}

/// Internal state for input expansion
struct DiscoveryState {
    pending: VecDeque<String>,
    config: DiscoveryConfig,
    glob_iter: Option<glob::Paths>,
    matched: usize,
}

impl DiscoveryState {
    fn new(arguments: Vec<String>, config: DiscoveryConfig) -> Self {
        Self {
            pending: arguments.into(),
            config,
            glob_iter: None,
            matched: 0,
        }
    }

    async fn next_input(&mut self) -> Option<Result<InputValidation>> {
        loop {
            if let Some(glob_iter) = self.glob_iter.as_mut() {
                match glob_iter.next() {
                    Some(Ok(path)) => {
                        self.matched += 1;
                        debug!("Pattern matched: {}", path.display());
                        return Some(self.validate(path).await);
                    }
                    Some(Err(e)) => {
                        let error_msg = format!("Glob iteration error: {e}");
                        warn!("{}", error_msg);
                        if self.config.fail_fast {
                            return Some(Err(anyhow::anyhow!(error_msg)));
                        }
                        continue;
                    }
                    None => {
                        self.glob_iter = None;
                        if self.matched == 0 {
                            warn!("Input pattern matched no files");
                            if self.config.fail_fast {
                                return Some(Err(anyhow::anyhow!("Input pattern matched no files")));
                            }
                        }
                    }
                }
            }

            let argument = self.pending.pop_front()?;
            if !is_glob_pattern(&argument) {
                return Some(self.validate(PathBuf::from(argument)).await);
            }

            debug!("Expanding input pattern: {}", argument);
            match glob(&argument) {
                Ok(paths) => {
                    self.glob_iter = Some(paths);
                    self.matched = 0;
                }
                Err(e) => {
                    let error_msg = format!("Invalid input pattern {argument}: {e}");
                    warn!("{}", error_msg);
                    if self.config.fail_fast {
                        return Some(Err(anyhow::anyhow!(error_msg)));
                    }
                    return Some(Ok(InputValidation {
                        path: PathBuf::from(argument),
                        error: Some(error_msg),
                    }));
                }
            }
        }
    }

    async fn validate(&self, path: PathBuf) -> Result<InputValidation> {
        let error = match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => None,
            Ok(_) => Some(format!("Path is not a file: {}", path.display())),
            Err(e) => Some(format!("Cannot access file {}: {}", path.display(), e)),
        };

        match error {
            Some(error) if self.config.fail_fast => Err(anyhow::anyhow!(error)),
            Some(error) => {
                warn!("{}", error);
                Ok(InputValidation {
                    path,
                    error: Some(error),
                })
            }
            None => Ok(InputValidation { path, error: None }),
        }
    }
}

/// Collect all expanded inputs into a Vec, stopping at the first hard error
pub async fn collect_inputs(
    arguments: Vec<String>,
    config: DiscoveryConfig,
) -> Result<Vec<InputValidation>> {
    let mut inputs = Vec::new();
    let mut stream = Box::pin(discover_inputs(arguments, config));

    while let Some(result) = stream.next().await {
        inputs.push(result?);
    }

    let valid_count = inputs.iter().filter(|i| i.is_valid()).count();
    let invalid_count = inputs.len() - valid_count;
    if invalid_count > 0 {
        warn!("Found {} inputs with validation issues", invalid_count);
    }
    info!("Input discovery summary: {} valid, {} invalid", valid_count, invalid_count);

    Ok(inputs)
}
