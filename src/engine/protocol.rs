//! Command classification for the two line protocols.
//!
//! Every inbound line is sorted into one of four types before dispatch:
//! CONTINUE (ignore during search), EXEC_AND_CONTINUE (execute now,
//! resume), FINISH (stop now, commit the best move) and CANCEL (stop now,
//! discard). The engine's own protocol and the xboard protocol are both
//! live at all times; a line that is not a native command is tried as an
//! xboard command.

use crate::board::is_move_str;
use crate::search::CmdType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// The engine-native line protocol.
    Native,
    Xboard,
}

/// Which engine modes an xboard command is valid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XbMode {
    /// Only outside analyze mode.
    Basic,
    /// Only inside analyze mode.
    Analyze,
    /// Always.
    All,
}

struct XbCmd {
    cmd: &'static str,
    cmd_type: CmdType,
    mode: XbMode,
}

const XB_CMDS: &[XbCmd] = &[
    XbCmd { cmd: "xboard", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "protover", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "accepted", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "rejected", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "new", cmd_type: CmdType::Cancel, mode: XbMode::All },
    XbCmd { cmd: "quit", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "force", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "go", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "playother", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "level", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "st", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "sd", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "time", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "otim", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "?", cmd_type: CmdType::Finish, mode: XbMode::Basic },
    XbCmd { cmd: "ping", cmd_type: CmdType::ExecAndContinue, mode: XbMode::All },
    XbCmd { cmd: "result", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "setboard", cmd_type: CmdType::Cancel, mode: XbMode::All },
    XbCmd { cmd: "hint", cmd_type: CmdType::ExecAndContinue, mode: XbMode::All },
    XbCmd { cmd: "bk", cmd_type: CmdType::ExecAndContinue, mode: XbMode::All },
    XbCmd { cmd: "undo", cmd_type: CmdType::Cancel, mode: XbMode::All },
    XbCmd { cmd: "remove", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "post", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "nopost", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "analyze", cmd_type: CmdType::Cancel, mode: XbMode::Basic },
    XbCmd { cmd: "name", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "computer", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Basic },
    XbCmd { cmd: "memory", cmd_type: CmdType::Cancel, mode: XbMode::All },
    XbCmd { cmd: "exit", cmd_type: CmdType::Cancel, mode: XbMode::Analyze },
    XbCmd { cmd: ".", cmd_type: CmdType::ExecAndContinue, mode: XbMode::Analyze },
];

/// Native commands and how they behave while a search runs.
const NATIVE_CMDS: &[(&str, CmdType)] = &[
    ("xboard", CmdType::ExecAndContinue),
    ("quit", CmdType::Cancel),
    ("debug", CmdType::ExecAndContinue),
    ("printboard", CmdType::ExecAndContinue),
    ("printeval", CmdType::ExecAndContinue),
    ("printmat", CmdType::ExecAndContinue),
    ("printkey", CmdType::ExecAndContinue),
    ("printmoves", CmdType::ExecAndContinue),
    ("perft", CmdType::Cancel),
    ("divide", CmdType::Cancel),
    ("help", CmdType::ExecAndContinue),
];

/// First word of a line.
#[must_use]
pub fn first_word(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Everything after the first word, trimmed.
#[must_use]
pub fn rest_of(line: &str) -> &str {
    match line.trim_start().split_once(char::is_whitespace) {
        Some((_, rest)) => rest.trim(),
        None => "",
    }
}

fn find_xb_cmd(word: &str) -> Option<&'static XbCmd> {
    XB_CMDS.iter().find(|c| c.cmd == word)
}

fn classify_xboard(line: &str, analyze: bool) -> CmdType {
    let word = first_word(line);
    if let Some(cmd) = find_xb_cmd(word) {
        let valid = match cmd.mode {
            XbMode::All => true,
            XbMode::Basic => !analyze,
            XbMode::Analyze => analyze,
        };
        if valid {
            return cmd.cmd_type;
        }
    } else if is_move_str(word) {
        return CmdType::Cancel;
    }
    // Unknown lines are answered right away with an error message.
    CmdType::ExecAndContinue
}

/// Sort a line into its command type.
#[must_use]
pub fn classify(line: &str, protocol: Protocol, analyze: bool) -> CmdType {
    if protocol == Protocol::Xboard || analyze {
        return classify_xboard(line, analyze);
    }
    let word = first_word(line);
    for (cmd, cmd_type) in NATIVE_CMDS {
        if *cmd == word {
            return *cmd_type;
        }
    }
    classify_xboard(line, analyze)
}

/// Is this line a known xboard command in the current mode (as opposed to
/// a move string or noise)?
#[must_use]
pub fn is_known_xb_command(line: &str, analyze: bool) -> bool {
    match find_xb_cmd(first_word(line)) {
        Some(cmd) => match cmd.mode {
            XbMode::All => true,
            XbMode::Basic => !analyze,
            XbMode::Analyze => analyze,
        },
        None => false,
    }
}

/// The feature string sent in reply to "protover 2".
#[must_use]
pub fn feature_string(name: &str, version: &str) -> String {
    format!(
        "feature myname=\"{name}-{version}\" ping=1 setboard=1 playother=1 san=0 \
         usermove=0 time=1 draw=0 variants=\"normal\" colors=0 sigint=0 sigterm=0 \
         reuse=1 analyze=1 ics=0 name=1 pause=0 nps=0 debug=0 memory=1 smp=0 \
         egt=scorpio done=1"
    )
}

/// Parse the xboard "level MOVES TIME INC" arguments. TIME is minutes or
/// "minutes:seconds", INC is in seconds.
#[must_use]
pub fn parse_level(args: &str) -> Option<(u32, u64, u64)> {
    let mut parts = args.split_whitespace();
    let moves: u32 = parts.next()?.parse().ok()?;
    let time = parts.next()?;
    let time_ms = match time.split_once(':') {
        Some((mins, secs)) => {
            let mins: u64 = mins.parse().ok()?;
            let secs: u64 = secs.parse().ok()?;
            (mins * 60 + secs) * 1000
        }
        None => {
            let mins: u64 = time.parse().ok()?;
            mins * 60 * 1000
        }
    };
    let inc_secs: u64 = parts.next()?.parse().ok()?;
    Some((moves, time_ms, inc_secs * 1000))
}
