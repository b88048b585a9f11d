//! Exit codes are a stable contract for automation.

use srg_core::exit_codes::ExitCode;

const ALL: [ExitCode; 9] = [
    ExitCode::Clean,
    ExitCode::Busy,
    ExitCode::ArgsError,
    ExitCode::ConfigError,
    ExitCode::PermissionError,
    ExitCode::LockError,
    ExitCode::InternalError,
    ExitCode::IoError,
    ExitCode::ParseError,
];

#[test]
fn values_are_stable() {
    let values: Vec<i32> = ALL.iter().map(|c| c.as_i32()).collect();
    assert_eq!(values, vec![0, 1, 10, 11, 12, 14, 20, 21, 22]);
}

#[test]
fn names_are_unique() {
    let mut names: Vec<&str> = ALL.iter().map(|c| c.code_name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), ALL.len());
}

#[test]
fn categories_partition_codes() {
    for code in ALL {
        let categories = [
            code.is_operational(),
            code.is_user_error(),
            code.is_internal_error(),
        ];
        assert_eq!(
            categories.iter().filter(|c| **c).count(),
            1,
            "{code} belongs to exactly one category"
        );
        assert_eq!(code.is_error(), !code.is_operational(), "{code}");
    }
}

#[test]
fn only_clean_is_success() {
    let successes: Vec<ExitCode> = ALL.into_iter().filter(|c| c.is_success()).collect();
    assert_eq!(successes, vec![ExitCode::Clean]);
}
