// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for `exec-kit` value types.

use proptest::prelude::*;

use exec_kit::{ExecError, ProcessBuilder, ProcessStreams, StreamDescriptor, StreamSlot};

// ── Leaf strategies ─────────────────────────────────────────────────────

fn arb_arg() -> impl Strategy<Value = String> {
    // Deliberately includes spaces, quotes, and shell metacharacters:
    // arguments are argv entries, never re-parsed.
    "[a-zA-Z0-9_ .;|$'\"*-]{0,24}"
}

fn arb_slot() -> impl Strategy<Value = StreamSlot> {
    prop_oneof![
        Just(StreamSlot::Stdin),
        Just(StreamSlot::Stdout),
        Just(StreamSlot::Stderr),
    ]
}

fn arb_descriptor() -> impl Strategy<Value = StreamDescriptor> {
    prop_oneof![
        Just(StreamDescriptor::Pipe),
        Just(StreamDescriptor::Inherit),
        Just(StreamDescriptor::Null),
    ]
}

// ── Property tests ──────────────────────────────────────────────────────

proptest! {
    /// `ProcessBuilder::new` never panics and starts with empty argv.
    #[test]
    fn builder_new_never_panics(command in ".*") {
        let builder = ProcessBuilder::new(command.clone());
        prop_assert_eq!(builder.command(), command.as_str());
        prop_assert!(builder.get_args().is_empty());
    }

    /// Arguments accumulate in order and verbatim.
    #[test]
    fn builder_args_accumulate_in_order(args in prop::collection::vec(arb_arg(), 0..8)) {
        let built = ProcessBuilder::new("prog").args(args.clone());
        prop_assert_eq!(built.get_args(), args.as_slice());
    }

    /// Every mutator leaves the original configuration untouched.
    #[test]
    fn builder_mutators_never_alias(arg in arb_arg()) {
        let base = ProcessBuilder::new("prog");
        let _extended = base.clone().arg(arg).env("K", "V").inherit_env(false);
        prop_assert!(base.get_args().is_empty());
    }

    /// `with` replaces exactly the addressed slot.
    #[test]
    fn streams_with_touches_one_slot(slot in arb_slot(), descriptor in arb_descriptor()) {
        let base = ProcessStreams::new();
        let changed = base.with(slot, descriptor.clone());
        for other in [StreamSlot::Stdin, StreamSlot::Stdout, StreamSlot::Stderr] {
            if other == slot {
                prop_assert_eq!(
                    changed.get(other).is_pipe(),
                    descriptor.is_pipe()
                );
            } else {
                prop_assert!(matches!(changed.get(other), StreamDescriptor::Inherit));
            }
        }
    }

    /// `pipe_to` splices only when the upstream stdout is pipe-like, and
    /// never rewires anything except the target's stdin.
    #[test]
    fn pipe_to_only_rewires_target_stdin(
        upstream_stdout in arb_descriptor(),
        target_stdout in arb_descriptor(),
    ) {
        let upstream = ProcessStreams::new().with_stdout(upstream_stdout.clone());
        let target = ProcessStreams::new().with_stdout(target_stdout.clone());
        let spliced = upstream.pipe_to(&target);

        if upstream_stdout.is_pipe_like() {
            prop_assert!(spliced.get(StreamSlot::Stdin).is_pipe_like());
        } else {
            prop_assert!(matches!(spliced.get(StreamSlot::Stdin), StreamDescriptor::Inherit));
        }
        prop_assert_eq!(
            spliced.get(StreamSlot::Stdout).is_pipe(),
            target_stdout.is_pipe()
        );
    }

    /// Error displays are never empty.
    #[test]
    fn error_display_never_empty(stages in 2usize..64) {
        prop_assert!(!ExecError::InvalidCommand.to_string().is_empty());
        prop_assert!(!ExecError::Timeout.to_string().is_empty());
        let pipeline_spawn = ExecError::PipelineSpawn { stages };
        prop_assert!(!pipeline_spawn.to_string().is_empty());
    }
}
