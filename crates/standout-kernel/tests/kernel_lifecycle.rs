use serde_json::json;
use standout_kernel::{
    ArgSpec, CommandSpec, FlagSpec, FlagType, FlagValue, FnCommand, HookAction, HookError,
    HookPhase, Kernel, KernelBuilder, KernelError, KernelState, ValidationError,
};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

fn events(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

fn label(command: Option<&CommandSpec>) -> String {
    command.map_or_else(|| "-".to_string(), |spec| spec.name.clone())
}

// A builder that records every hook and the exit handler into `log`
fn traced(log: &Log) -> KernelBuilder {
    let (bf, af, br, ar, exit) = (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
    Kernel::builder()
        .before_find(move |cmd| {
            push(&bf, format!("before:find {}", label(cmd)));
            Ok(())
        })
        .after_find(move |cmd| {
            push(&af, format!("after:find {}", label(cmd)));
            Ok(())
        })
        .before_run(move |cmd| {
            push(&br, format!("before:run {}", cmd.name()));
            Ok(())
        })
        .after_run(move |cmd| {
            push(&ar, format!("after:run {}", cmd.name()));
            Ok(())
        })
        .on_exit(move |kernel: &Kernel| {
            push(&exit, format!("exit {}", kernel.exit_code().unwrap_or(-1)));
            Ok(())
        })
}

fn logging_command(name: &str, log: &Log) -> FnCommand<impl Fn(&mut standout_kernel::CommandContext<'_>) -> anyhow::Result<()>> {
    let log = log.clone();
    let tag = format!("run {name}");
    FnCommand::new(CommandSpec::new(name), move |_ctx| {
        push(&log, tag.clone());
        Ok(())
    })
}

#[test]
fn test_empty_argv_runs_default_command() {
    let log = new_log();
    let mut kernel = traced(&log)
        .default_command(logging_command("home", &log))
        .build()
        .unwrap();

    kernel.handle(Vec::<String>::new());

    assert_eq!(
        events(&log),
        vec![
            "before:find home",
            "after:find home",
            "before:run home",
            "run home",
            "after:run home",
            "exit 0",
        ]
    );
    assert_eq!(kernel.state(), KernelState::Completed);
    assert_eq!(kernel.entry_command().map(|c| c.name()), Some("home"));
}

#[test]
fn test_hook_order_with_sub_command() {
    let log = new_log();
    let outer_log = log.clone();
    let mut kernel = traced(&log)
        .command(FnCommand::new(CommandSpec::new("outer"), move |ctx| {
            push(&outer_log, "run outer");
            ctx.exec("inner", &["virk"])?;
            push(&outer_log, "outer resumed");
            Ok(())
        }))
        .command({
            let log = log.clone();
            FnCommand::new(
                CommandSpec::new("inner").arg(ArgSpec::string("name")),
                move |ctx| {
                    let name = ctx.arg("name").and_then(|v| v.as_str()).unwrap_or_default();
                    push(&log, format!("run inner {name}"));
                    Ok(())
                },
            )
        })
        .build()
        .unwrap();

    kernel.handle(["outer"]);

    assert_eq!(
        events(&log),
        vec![
            "before:find outer",
            "after:find outer",
            "before:run outer",
            "run outer",
            "before:find inner",
            "after:find inner",
            "before:run inner",
            "run inner virk",
            "after:run inner",
            "outer resumed",
            "after:run outer",
            "exit 0",
        ]
    );
}

#[test]
fn test_unknown_command_reports_suggestions() {
    let log = new_log();
    let mut kernel = traced(&log)
        .command(logging_command("install", &log))
        .build()
        .unwrap();

    kernel.handle(["itall"]);

    assert_eq!(
        events(&log),
        vec!["before:find -", "after:find -", "exit 1"]
    );
    let error = kernel.error().expect("error recorded");
    assert_eq!(
        error.to_string(),
        "E_INVALID_COMMAND: \"itall\" is not a registered command"
    );
    match error {
        KernelError::InvalidCommand { suggestions, .. } => assert_eq!(suggestions, &["install"]),
        other => panic!("expected InvalidCommand, got {:?}", other),
    }
    assert!(error.render().contains("Did you mean one of these?\n  install"));
    assert_eq!(kernel.exit_code(), Some(1));
}

#[test]
fn test_unknown_command_on_empty_registry() {
    let log = new_log();
    let mut kernel = traced(&log).build().unwrap();

    kernel.handle(["nope"]);

    assert_eq!(kernel.exit_code(), Some(1));
    assert_eq!(
        kernel.error().unwrap().render(),
        "E_INVALID_COMMAND: \"nope\" is not a registered command"
    );
    assert_eq!(events(&log), vec!["before:find -", "after:find -", "exit 1"]);
}

#[test]
fn test_unknown_command_still_runs_global_flags() {
    let log = new_log();
    let help = log.clone();
    let mut kernel = traced(&log)
        .flag(FlagSpec::new("help"), move |_, _, command| {
            push(&help, format!("help {}", label(command)));
            Ok(())
        })
        .build()
        .unwrap();

    kernel.handle(["nope", "--help"]);

    assert_eq!(
        events(&log),
        vec!["before:find -", "after:find -", "help -", "exit 1"]
    );
    assert!(matches!(kernel.error(), Some(KernelError::InvalidCommand { .. })));
}

#[test]
fn test_missing_argument_after_global_flags() {
    let log = new_log();
    let verbose = log.clone();
    let mut kernel = traced(&log)
        .command(FnCommand::new(
            CommandSpec::new("greet").arg(ArgSpec::string("name")),
            |_ctx| panic!("greet must not run without a name"),
        ))
        .flag(FlagSpec::new("verbose"), move |value, _, command| {
            push(&verbose, format!("verbose={:?} {}", value.as_bool(), label(command)));
            Ok(())
        })
        .build()
        .unwrap();

    kernel.handle(["greet", "--verbose"]);

    assert_eq!(
        events(&log),
        vec![
            "before:find greet",
            "after:find greet",
            "verbose=Some(true) greet",
            "exit 1",
        ]
    );
    let error = kernel.error().unwrap();
    assert_eq!(
        error.to_string(),
        "E_MISSING_ARGUMENT: Missing required argument \"name\""
    );
    assert!(error.render().ends_with("Run \"greet --help\" for usage"));
}

#[test]
fn test_array_flag_with_equals() {
    let seen = Rc::new(RefCell::new(None));
    let sink = seen.clone();
    let mut kernel = Kernel::builder()
        .command(FnCommand::new(
            CommandSpec::new("build").flag(FlagSpec::new("files").kind(FlagType::Array)),
            move |ctx| {
                *sink.borrow_mut() = ctx.flag("files").cloned();
                Ok(())
            },
        ))
        .on_exit(|_| Ok(()))
        .build()
        .unwrap();

    kernel.handle(["build", "--files=foo.js"]);

    assert_eq!(*seen.borrow(), Some(FlagValue::Array(vec!["foo.js".into()])));
    assert_eq!(kernel.exit_code(), Some(0));
}

#[test]
fn test_bare_numeric_global_flag_is_invalid() {
    let log = new_log();
    let level = log.clone();
    let mut kernel = traced(&log)
        .flag(
            FlagSpec::new("log-level").kind(FlagType::Number),
            move |_, _, _| {
                push(&level, "log-level");
                Ok(())
            },
        )
        .build()
        .unwrap();

    kernel.handle(["--log-level"]);

    assert_eq!(events(&log), vec!["exit 1"]);
    assert_eq!(
        kernel.error().unwrap().to_string(),
        "E_INVALID_FLAG: \"log-level\" flag expects a \"numeric\" value"
    );
}

#[test]
fn test_global_flags_without_command() {
    let log = new_log();
    let (help, env) = (log.clone(), log.clone());
    let mut kernel = traced(&log)
        .flag(FlagSpec::new("help").alias('h'), move |_, parsed, command| {
            push(&help, format!("help {} h={}", label(command), parsed.contains("h")));
            Ok(())
        })
        .flag(
            FlagSpec::new("env").kind(FlagType::String).default_value("dev"),
            move |value, _, _| {
                push(&env, format!("env {}", value.as_str().unwrap_or_default()));
                Ok(())
            },
        )
        .build()
        .unwrap();

    kernel.handle(["-h"]);

    assert_eq!(events(&log), vec!["help - h=true", "env dev", "exit 0"]);
    assert!(kernel.error().is_none());
}

#[test]
fn test_global_flag_failure_becomes_process_error() {
    let mut kernel = Kernel::builder()
        .command(FnCommand::new(CommandSpec::new("greet"), |_ctx| {
            panic!("greet must not run after a failing flag handler")
        }))
        .flag(FlagSpec::new("version"), |_, _, _| {
            anyhow::bail!("cannot read version file")
        })
        .on_exit(|_| Ok(()))
        .build()
        .unwrap();

    kernel.handle(["greet", "--version"]);

    match kernel.error() {
        Some(KernelError::GlobalFlag { flag, source }) => {
            assert_eq!(flag, "version");
            assert_eq!(source.to_string(), "cannot read version file");
        }
        other => panic!("expected GlobalFlag, got {:?}", other),
    }
    assert_eq!(kernel.exit_code(), Some(1));
}

#[test]
fn test_unknown_flag() {
    let log = new_log();
    let mut kernel = traced(&log)
        .command(logging_command("greet", &log))
        .build()
        .unwrap();

    kernel.handle(["greet", "--nope"]);

    assert!(matches!(
        kernel.error(),
        Some(KernelError::UnknownFlag { flag }) if flag == "nope"
    ));
    assert!(!events(&log).contains(&"run greet".to_string()));
}

#[test]
fn test_exit_handler_runs_once() {
    let log = new_log();
    let mut kernel = traced(&log)
        .command(logging_command("greet", &log))
        .build()
        .unwrap();

    kernel.handle(["greet"]);
    kernel.exit_process(None);
    kernel.exit_process(Some(KernelError::InvalidArgv {
        message: "late".into(),
    }));
    kernel.handle(["greet"]);

    let exits = events(&log).iter().filter(|e| e.starts_with("exit")).count();
    assert_eq!(exits, 1);
    assert_eq!(kernel.exit_code(), Some(0));
    assert!(kernel.error().is_none());
}

#[test]
fn test_stay_alive_defers_exit() {
    let log = new_log();
    let mut kernel = traced(&log)
        .command(FnCommand::new(
            CommandSpec::new("serve").stay_alive(true),
            |ctx| {
                // a sub-command cannot end the episode
                ctx.exec("child", &["now"])?;
                Ok(())
            },
        ))
        .command(FnCommand::new(
            CommandSpec::new("child").arg(ArgSpec::string("when")),
            |ctx| {
                ctx.exit(None);
                Ok(())
            },
        ))
        .build()
        .unwrap();

    kernel.handle(["serve"]);

    assert_eq!(kernel.state(), KernelState::Running);
    assert_eq!(kernel.exit_code(), None);
    assert!(!events(&log).iter().any(|e| e.starts_with("exit")));
    assert!(!events(&log).contains(&"after:run serve".to_string()));

    let id = kernel.entry_command().map(|c| c.id()).unwrap();
    kernel.exit(id, None);

    assert_eq!(kernel.state(), KernelState::Completed);
    assert_eq!(kernel.exit_code(), Some(0));
    assert_eq!(
        events(&log).iter().rev().take(2).cloned().collect::<Vec<_>>(),
        vec!["exit 0", "after:run serve"]
    );
}

#[test]
fn test_entry_exit_finalizes_immediately() {
    let log = new_log();
    let body = log.clone();
    let mut kernel = traced(&log)
        .command(FnCommand::new(
            CommandSpec::new("serve").stay_alive(true),
            move |ctx| {
                ctx.exit(Some(anyhow::anyhow!("port in use")));
                push(&body, "after exit");
                Ok(())
            },
        ))
        .build()
        .unwrap();

    kernel.handle(["serve"]);

    assert_eq!(
        events(&log),
        vec![
            "before:find serve",
            "after:find serve",
            "before:run serve",
            "after:run serve",
            "exit 1",
            "after exit",
        ]
    );
    assert_eq!(kernel.error().unwrap().to_string(), "port in use");
}

#[test]
fn test_before_run_failure_still_runs_after_run() {
    let log = new_log();
    let mut kernel = traced(&log)
        .before_run(|cmd| Err(HookError::new(format!("{} is locked", cmd.name()))))
        .command(logging_command("deploy", &log))
        .build()
        .unwrap();

    kernel.handle(["deploy"]);

    assert_eq!(
        events(&log),
        vec![
            "before:find deploy",
            "after:find deploy",
            "before:run deploy",
            "after:run deploy",
            "exit 1",
        ]
    );
    assert!(matches!(
        kernel.error(),
        Some(KernelError::Hook {
            phase: HookPhase::Before,
            action: HookAction::Run,
            ..
        })
    ));
}

#[test]
fn test_after_run_failure_replaces_error() {
    let mut kernel = Kernel::builder()
        .command(FnCommand::new(CommandSpec::new("deploy"), |_ctx| {
            anyhow::bail!("deploy failed")
        }))
        .after_run(|_| Err(HookError::new("cleanup failed")))
        .on_exit(|_| Ok(()))
        .build()
        .unwrap();

    kernel.handle(["deploy"]);

    assert!(matches!(
        kernel.error(),
        Some(KernelError::Hook {
            phase: HookPhase::After,
            ..
        })
    ));
    assert_eq!(kernel.exit_code(), Some(1));
}

#[test]
fn test_entry_command_chooses_exit_code() {
    let mut kernel = Kernel::builder()
        .command(FnCommand::new(CommandSpec::new("check"), |ctx| {
            ctx.command_mut().set_exit_code(3);
            Ok(())
        }))
        .on_exit(|_| Ok(()))
        .build()
        .unwrap();

    kernel.handle(["check"]);

    assert_eq!(kernel.exit_code(), Some(3));
    assert!(kernel.error().is_none());
}

#[test]
fn test_recorded_error_is_adopted() {
    let mut kernel = Kernel::builder()
        .command(FnCommand::new(CommandSpec::new("lint"), |ctx| {
            ctx.command_mut().set_error(anyhow::anyhow!("3 files have problems"));
            Ok(())
        }))
        .on_exit(|_| Ok(()))
        .build()
        .unwrap();

    kernel.handle(["lint"]);

    assert_eq!(kernel.exit_code(), Some(1));
    assert_eq!(kernel.error().unwrap().to_string(), "3 files have problems");
}

#[test]
fn test_sub_command_error_propagates() {
    let log = new_log();
    let mut kernel = traced(&log)
        .command(FnCommand::new(CommandSpec::new("outer"), |ctx| {
            ctx.exec("inner", &["x"])?;
            Ok(())
        }))
        .command(FnCommand::new(
            CommandSpec::new("inner").arg(ArgSpec::string("x")),
            |_ctx| anyhow::bail!("inner failed"),
        ))
        .build()
        .unwrap();

    kernel.handle(["outer"]);

    let log = events(&log);
    assert!(log.contains(&"after:run inner".to_string()));
    assert_eq!(log.last().map(String::as_str), Some("exit 1"));
    assert!(matches!(kernel.error(), Some(KernelError::Command(_))));
    assert_eq!(kernel.error().unwrap().to_string(), "inner failed");
}

#[test]
fn test_sub_command_missing_argument_keeps_variant() {
    let mut kernel = Kernel::builder()
        .command(FnCommand::new(CommandSpec::new("outer"), |ctx| {
            ctx.exec::<&str>("inner", &[])?;
            Ok(())
        }))
        .command(FnCommand::new(
            CommandSpec::new("inner").arg(ArgSpec::string("target")),
            |_ctx| Ok(()),
        ))
        .on_exit(|_| Ok(()))
        .build()
        .unwrap();

    kernel.handle(["outer"]);

    assert!(matches!(
        kernel.error(),
        Some(KernelError::MissingArgument { argument, command })
            if argument == "target" && command == "inner"
    ));
}

#[test]
fn test_alias_and_spread_binding() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut kernel = Kernel::builder()
        .command(FnCommand::new(
            CommandSpec::new("install")
                .alias("i")
                .arg(ArgSpec::spread("packages"))
                .flag(FlagSpec::new("retries").kind(FlagType::Number).default_value(3)),
            move |ctx| {
                let packages = ctx.arg("packages").and_then(|v| v.as_list()).unwrap_or_default();
                let retries = ctx.flag("retries").and_then(|v| v.as_number());
                sink.borrow_mut().push(format!("{} {:?}", packages.join(","), retries));
                Ok(())
            },
        ))
        .on_exit(|_| Ok(()))
        .build()
        .unwrap();

    kernel.handle(["i", "lodash", "react"]);

    assert_eq!(*seen.borrow(), vec!["lodash,react Some(3.0)"]);
}

#[test]
fn test_manifest_command() {
    let spec = CommandSpec::from_manifest(&json!({
        "commandName": "make:controller",
        "commandPath": "./commands/MakeController",
        "aliases": ["mc"],
        "args": [{ "name": "name" }],
        "flags": [{ "name": "resource", "type": "boolean" }],
        "settings": { "stayAlive": false }
    }))
    .unwrap();

    let seen = Rc::new(RefCell::new(None));
    let sink = seen.clone();
    let mut kernel = Kernel::builder()
        .command(FnCommand::new(spec, move |ctx| {
            *sink.borrow_mut() = Some((
                ctx.arg("name").and_then(|v| v.as_str()).map(str::to_string),
                ctx.flag("resource").and_then(FlagValue::as_bool),
            ));
            Ok(())
        }))
        .on_exit(|_| Ok(()))
        .build()
        .unwrap();

    kernel.handle(["mc", "users", "--resource"]);

    assert_eq!(
        *seen.borrow(),
        Some((Some("users".to_string()), Some(true)))
    );
}

#[test]
fn test_find_runs_hooks() {
    let log = new_log();
    let kernel = traced(&log)
        .command(logging_command("greet", &log))
        .build()
        .unwrap();

    assert_eq!(kernel.find(&["greet"]).unwrap().map(|s| s.name.clone()), Some("greet".to_string()));
    assert!(kernel.find(&["nope"]).unwrap().is_none());
    assert_eq!(
        events(&log),
        vec![
            "before:find greet",
            "after:find greet",
            "before:find -",
            "after:find -",
        ]
    );
}

#[test]
fn test_find_hook_failure_aborts() {
    let log = new_log();
    let mut kernel = traced(&log)
        .after_find(|_| Err(HookError::new("lookup vetoed")))
        .command(logging_command("greet", &log))
        .build()
        .unwrap();

    kernel.handle(["greet"]);

    assert!(!events(&log).contains(&"run greet".to_string()));
    assert!(matches!(
        kernel.error(),
        Some(KernelError::Hook {
            phase: HookPhase::After,
            action: HookAction::Find,
            ..
        })
    ));
}

#[test]
fn test_unknown_flag_skips_global_handlers() {
    let log = new_log();
    let seen = log.clone();
    let mut kernel = traced(&log)
        .flag(FlagSpec::new("verbose"), move |_, _, _| {
            push(&seen, "verbose");
            Ok(())
        })
        .command(logging_command("greet", &log))
        .build()
        .unwrap();

    kernel.handle(["greet", "--verbose", "--nope"]);

    assert!(matches!(
        kernel.error(),
        Some(KernelError::UnknownFlag { flag }) if flag == "nope"
    ));
    assert!(!events(&log).contains(&"verbose".to_string()));
    assert!(!events(&log).contains(&"run greet".to_string()));
}

#[test]
fn test_before_run_stops_at_first_failure() {
    let log = new_log();
    let (second, exit) = (log.clone(), log.clone());
    let mut kernel = Kernel::builder()
        .before_run(|cmd| Err(HookError::new(format!("{} is locked", cmd.name()))))
        .before_run(move |cmd| {
            push(&second, format!("second before:run {}", cmd.name()));
            Ok(())
        })
        .on_exit(move |kernel: &Kernel| {
            push(&exit, format!("exit {}", kernel.exit_code().unwrap_or(-1)));
            Ok(())
        })
        .command(logging_command("deploy", &log))
        .build()
        .unwrap();

    kernel.handle(["deploy"]);

    assert_eq!(events(&log), vec!["exit 1"]);
    assert!(matches!(
        kernel.error(),
        Some(KernelError::Hook {
            phase: HookPhase::Before,
            action: HookAction::Run,
            ..
        })
    ));
}

#[test]
fn test_exit_handler_sees_entry_command_on_early_exit() {
    let log = new_log();
    let (body, exit) = (log.clone(), log.clone());
    let mut kernel = Kernel::builder()
        .command(FnCommand::new(
            CommandSpec::new("serve").stay_alive(true),
            move |ctx| {
                ctx.command_mut().set_exit_code(3);
                ctx.exit(None);
                push(&body, "after exit");
                Ok(())
            },
        ))
        .on_exit(move |kernel: &Kernel| {
            let entry = kernel.entry_command().map(|command| command.name().to_string());
            push(&exit, format!("exit {:?}", entry));
            Ok(())
        })
        .build()
        .unwrap();

    kernel.handle(["serve"]);

    assert_eq!(events(&log), vec!["exit Some(\"serve\")", "after exit"]);
    assert_eq!(kernel.exit_code(), Some(3));
    assert_eq!(kernel.entry_command().map(|command| command.name()), Some("serve"));
}

#[test]
fn test_global_and_command_alias_clash_is_rejected() {
    let err = Kernel::builder()
        .flag(FlagSpec::new("help").alias('h'), |_, _, _| Ok(()))
        .command(FnCommand::new(
            CommandSpec::new("serve").flag(FlagSpec::new("host").alias('h').kind(FlagType::String)),
            |_ctx| Ok(()),
        ))
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        ValidationError::FlagConflict {
            owner: "command \"serve\" and the global flags".into(),
            flag: "host".into(),
            other: "help".into(),
            key: "h".into(),
        }
    );
}

#[test]
fn test_global_flag_added_after_commands_is_checked() {
    let mut kernel = Kernel::new();
    kernel
        .command(FnCommand::new(
            CommandSpec::new("serve").flag(FlagSpec::new("host").alias('h').kind(FlagType::String)),
            |_ctx| Ok(()),
        ))
        .unwrap();

    let err = kernel
        .flag(FlagSpec::new("help").alias('h'), |_, _, _| Ok(()))
        .unwrap_err();

    assert!(matches!(err, ValidationError::FlagConflict { ref key, .. } if key == "h"));
    assert_eq!(kernel.flags().count(), 0);
}

#[test]
fn test_global_flags_must_be_distinct() {
    let err = Kernel::builder()
        .flag(FlagSpec::new("verbose"), |_, _, _| Ok(()))
        .flag(FlagSpec::new("verbose").alias('v'), |_, _, _| Ok(()))
        .build()
        .unwrap_err();
    assert!(matches!(err, ValidationError::DuplicateFlag { ref owner, .. } if owner == "global flags"));

    let err = Kernel::builder()
        .flag(FlagSpec::new("version").alias('v'), |_, _, _| Ok(()))
        .flag(FlagSpec::new("verbose").alias('v'), |_, _, _| Ok(()))
        .build()
        .unwrap_err();
    assert!(matches!(err, ValidationError::FlagConflict { .. }));
}

#[test]
fn test_command_flags_sharing_alias_are_rejected() {
    let err = Kernel::builder()
        .command(FnCommand::new(
            CommandSpec::new("build")
                .flag(FlagSpec::new("watch").alias('w'))
                .flag(FlagSpec::new("workers").alias('w').kind(FlagType::Number)),
            |_ctx| Ok(()),
        ))
        .build()
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Flags \"workers\" and \"watch\" in command \"build\" both answer to \"w\""
    );
}

#[test]
fn test_command_cannot_retype_global_flag() {
    let retyped = || {
        FnCommand::new(
            CommandSpec::new("log").flag(FlagSpec::new("level").kind(FlagType::Number)),
            |_ctx| Ok(()),
        )
    };
    let expected = ValidationError::GlobalFlagMismatch {
        command: "log".into(),
        flag: "level".into(),
    };

    let err = Kernel::builder()
        .flag(FlagSpec::new("level").kind(FlagType::String), |_, _, _| Ok(()))
        .command(retyped())
        .build()
        .unwrap_err();
    assert_eq!(err, expected);

    let mut kernel = Kernel::new();
    kernel.command(retyped()).unwrap();
    let err = kernel
        .flag(FlagSpec::new("level").kind(FlagType::String), |_, _, _| Ok(()))
        .unwrap_err();
    assert_eq!(err, expected);
}

#[test]
fn test_command_may_redeclare_global_flag() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let (global, body) = (seen.clone(), seen.clone());
    let mut kernel = Kernel::builder()
        .on_exit(|_| Ok(()))
        .flag(FlagSpec::new("level").kind(FlagType::Number), move |value, _, _| {
            global.borrow_mut().push(format!("global {:?}", value.as_number()));
            Ok(())
        })
        .command(FnCommand::new(
            CommandSpec::new("log").flag(FlagSpec::new("level").kind(FlagType::Number)),
            move |ctx| {
                let level = ctx.flag("level").and_then(FlagValue::as_number);
                body.borrow_mut().push(format!("command {:?}", level));
                Ok(())
            },
        ))
        .build()
        .unwrap();

    kernel.handle(["log", "--level=2"]);

    assert_eq!(*seen.borrow(), vec!["global Some(2.0)", "command Some(2.0)"]);
    assert_eq!(kernel.exit_code(), Some(0));
}
