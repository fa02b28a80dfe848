//! Decides what a fresh process does about elevation before any UI exists.

/// Appended to the argument list of the elevated relaunch.
pub const ELEVATED_MARKER: &str = "--svctoggle-elevated-relaunch";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bootstrap {
    /// Already elevated; carry on with the remaining arguments.
    Proceed { args: Vec<String> },
    /// Not elevated: relaunch once with these parameters, then exit.
    Relaunch { parameters: String },
    /// A relaunch already happened and still produced no elevation.
    GiveUp,
}

/// `args` excludes the program name.
pub fn plan(is_admin: bool, args: &[String]) -> Bootstrap {
    let already_relaunched = args.iter().any(|a| a == ELEVATED_MARKER);
    let forwarded: Vec<String> = args
        .iter()
        .filter(|a| *a != ELEVATED_MARKER)
        .cloned()
        .collect();
    if is_admin {
        Bootstrap::Proceed { args: forwarded }
    } else if already_relaunched {
        Bootstrap::GiveUp
    } else {
        let mut relaunch = forwarded;
        relaunch.push(ELEVATED_MARKER.to_string());
        Bootstrap::Relaunch {
            parameters: join_args(&relaunch),
        }
    }
}

/// Join arguments into a single command line, quoting where Windows would split.
pub fn join_args(args: &[String]) -> String {
    args.iter()
        .map(|a| quote_arg(a))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return arg.to_string();
    }
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                out.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            _ => {
                out.extend(std::iter::repeat_n('\\', backslashes));
                out.push(c);
                backslashes = 0;
            }
        }
    }
    out.extend(std::iter::repeat_n('\\', backslashes * 2));
    out.push('"');
    out
}
