/// How a single whitespace-delimited position is written on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of non-whitespace characters.
    Bare,
    /// A double-quoted string which may contain spaces and `\"` escapes.
    Quoted,
}

/// One position of the line grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Field name, or `None` for a position that is consumed but not kept.
    pub name: Option<&'static str>,
    pub kind: TokenKind,
}

impl Slot {
    pub const fn field(name: &'static str, kind: TokenKind) -> Self {
        Self {
            name: Some(name),
            kind,
        }
    }

    pub const fn ignored(kind: TokenKind) -> Self {
        Self { name: None, kind }
    }
}

use TokenKind::{Bare, Quoted};

/// Positional grammar of an application load balancer access log line.
///
/// Matches the layout without the `domain_name` and `chosen_cert_arn`
/// columns between `trace_id` and `match_priority`; lines that carry them
/// are rejected at `match_priority`. Columns past the last slot are ignored.
pub const ALB_GRAMMAR: &[Slot] = &[
    Slot::field("type", Bare),
    Slot::field("time", Bare),
    Slot::field("elb", Bare),
    Slot::field("client", Bare),
    Slot::field("target", Bare),
    Slot::field("req_proc_time", Bare),
    Slot::field("target_proc_time", Bare),
    Slot::field("resp_proc_time", Bare),
    Slot::field("elb_status", Bare),
    Slot::field("target_status", Bare),
    Slot::field("recv_bytes", Bare),
    Slot::field("sent_bytes", Bare),
    Slot::field("request", Quoted),
    Slot::field("user_agent", Quoted),
    // ssl_cipher
    Slot::ignored(Bare),
    // ssl_protocol
    Slot::ignored(Bare),
    Slot::field("target_group_arn", Bare),
    Slot::field("trace_id", Quoted),
    Slot::field("match_priority", Bare),
    Slot::field("req_creation_time", Bare),
    Slot::field("action_executed", Quoted),
    // redirect_url
    Slot::ignored(Quoted),
    // error_reason
    Slot::ignored(Quoted),
    Slot::field("target_list", Quoted),
    Slot::field("status_code", Quoted),
];

/// Field names of a parsed record, in output order.
pub const FIELD_NAMES: &[&str] = &[
    "type",
    "time",
    "elb",
    "client",
    "target",
    "req_proc_time",
    "target_proc_time",
    "resp_proc_time",
    "elb_status",
    "target_status",
    "recv_bytes",
    "sent_bytes",
    "request",
    "user_agent",
    "target_group_arn",
    "trace_id",
    "match_priority",
    "req_creation_time",
    "action_executed",
    "target_list",
    "status_code",
];

pub const FIELD_COUNT: usize = FIELD_NAMES.len();
