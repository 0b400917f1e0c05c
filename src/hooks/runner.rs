//! External command hook execution.
//!
//! `[build.hooks]` pre/post commands run with `$ONEPACK_*` environment
//! variables, substituted into arguments and exported to the child.

use anyhow::Result;
use rustc_hash::FxHashMap;

use crate::config::{HookConfig, PackConfig};
use crate::utils::exec::Cmd;

// ============================================================================
// environment variables
// ============================================================================

/// Build `$ONEPACK_*` environment variables for hook execution.
pub fn build_onepack_vars(config: &PackConfig) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();

    vars.insert("ONEPACK_ROOT".into(), config.get_root().display().to_string());
    vars.insert("ONEPACK_SRC".into(), config.build.src.display().to_string());
    vars.insert(
        "ONEPACK_OUTPUT".into(),
        config.build.output.display().to_string(),
    );
    vars.insert(
        "ONEPACK_STRATEGY".into(),
        config.codec.strategy.as_str().into(),
    );

    vars
}

/// Resolve `$ONEPACK_*` variables in command arguments.
pub fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for (key, value) in vars {
                let pattern = format!("${key}");
                result = result.replace(&pattern, value);
            }
            result
        })
        .collect()
}

// ============================================================================
// hook execution
// ============================================================================

/// Execute a single hook. `phase` is used for logging ("pre" or "post").
pub fn run_hook(hook: &HookConfig, config: &PackConfig, phase: &str) -> Result<()> {
    if !hook.enable || hook.command.is_empty() {
        return Ok(());
    }

    let vars = build_onepack_vars(config);
    let resolved = resolve_args(&hook.command, &vars);

    if !hook.quiet {
        crate::log!(phase; "`{}` running", hook.display_name());
    }

    let output = Cmd::from_slice(&resolved)
        .cwd(config.get_root())
        .envs(vars)
        .run()?;

    if !hook.quiet {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            println!("{stdout}");
        }
    }

    Ok(())
}

/// Execute all pre hooks, in config order.
pub fn run_pre_hooks(config: &PackConfig) -> Result<()> {
    for hook in &config.build.hooks.pre {
        run_hook(hook, config, "pre")?;
    }
    Ok(())
}

/// Execute all post hooks, in config order.
pub fn run_post_hooks(config: &PackConfig) -> Result<()> {
    for hook in &config.build.hooks.post {
        run_hook(hook, config, "post")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_args_simple() {
        let mut vars = FxHashMap::default();
        vars.insert("ONEPACK_SRC".into(), "/path/to/build".into());
        vars.insert("ONEPACK_OUTPUT".into(), "/path/to/out.html".into());

        let args = vec![
            "gzip".into(),
            "-k".into(),
            "$ONEPACK_OUTPUT".into(),
        ];
        let resolved = resolve_args(&args, &vars);
        assert_eq!(resolved[0], "gzip");
        assert_eq!(resolved[2], "/path/to/out.html");
    }

    #[test]
    fn test_resolve_args_no_vars() {
        let vars = FxHashMap::default();
        let args = vec!["echo".into(), "hello".into()];
        assert_eq!(resolve_args(&args, &vars), args);
    }

    #[test]
    fn test_resolve_args_multiple_vars_in_one_arg() {
        let mut vars = FxHashMap::default();
        vars.insert("ONEPACK_ROOT".into(), "/root".into());
        vars.insert("ONEPACK_SRC".into(), "/root/build".into());

        let args = vec!["cp $ONEPACK_SRC/x $ONEPACK_ROOT/y".into()];
        assert_eq!(resolve_args(&args, &vars)[0], "cp /root/build/x /root/y");
    }

    #[test]
    fn test_disabled_hook_is_skipped() {
        let hook = HookConfig {
            enable: false,
            name: Some("never".into()),
            command: vec!["false".into()],
            quiet: true,
        };
        let config = PackConfig::default();
        assert!(run_hook(&hook, &config, "pre").is_ok());
    }
}
