//! Typed callback payloads.
//!
//! Every inline button carries one of these actions, encoded as a short verb
//! plus `:`-joined fields. `:` never occurs inside a DNS name, so decoding is
//! a plain split. Record rows are addressed as `(zone, page, row)` rather
//! than by backend record ID, which keeps payloads inside Telegram's 64-byte
//! limit; the zone component is truncated from the right when even that is
//! too long (colliding truncations of very long zone names stay ambiguous —
//! a known limitation).

use std::str::FromStr;

use crate::dns::RecordType;

/// Telegram caps callback payloads at 64 bytes.
pub const MAX_CALLBACK_BYTES: usize = 64;

const SEP: char = ':';

/// Which single field an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Content,
    Ttl,
    Proxied,
}

impl EditField {
    fn as_str(&self) -> &'static str {
        match self {
            EditField::Content => "content",
            EditField::Ttl => "ttl",
            EditField::Proxied => "proxied",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "content" => Some(EditField::Content),
            "ttl" => Some(EditField::Ttl),
            "proxied" => Some(EditField::Proxied),
            _ => None,
        }
    }
}

/// Screen a Back button returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    SelectZone,
    SelectType,
    InputName,
    InputContent,
    SelectTtl,
    RecordView,
}

impl BackTarget {
    fn as_str(&self) -> &'static str {
        match self {
            BackTarget::SelectZone => "zone",
            BackTarget::SelectType => "type",
            BackTarget::InputName => "name",
            BackTarget::InputContent => "content",
            BackTarget::SelectTtl => "ttl",
            BackTarget::RecordView => "view",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "zone" => Some(BackTarget::SelectZone),
            "type" => Some(BackTarget::SelectType),
            "name" => Some(BackTarget::InputName),
            "content" => Some(BackTarget::InputContent),
            "ttl" => Some(BackTarget::SelectTtl),
            "view" => Some(BackTarget::RecordView),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Menu,
    Zones,
    Create,
    Manage,
    SelectZoneCreate(String),
    SelectZoneManage(String),
    CreateInZone(String),
    SelectType(RecordType),
    SelectTtl(u32),
    SelectProxied(bool),
    ConfirmCreate,
    CancelCreate,
    Back(BackTarget),
    Page { zone: String, page: usize },
    Refresh { zone: String },
    ViewRecord { zone: String, page: usize, row: usize },
    EditRecord { zone: String, page: usize, row: usize, field: EditField },
    EditTtlChoice(u32),
    EditProxiedChoice(bool),
    CancelEdit,
    DeleteRecord { zone: String, page: usize, row: usize },
    RequestAccess,
    ApproveRequest(i64),
    RejectRequest(i64),
    Tokens,
    TokenGenerate,
    TokenList,
    TokenDeleteMenu,
    TokenDelete(usize),
    Noop,
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Menu => "menu".into(),
            CallbackAction::Zones => "zones".into(),
            CallbackAction::Create => "create".into(),
            CallbackAction::Manage => "manage".into(),
            CallbackAction::SelectZoneCreate(zone) => with_zone("zc", zone, ""),
            CallbackAction::SelectZoneManage(zone) => with_zone("zm", zone, ""),
            CallbackAction::CreateInZone(zone) => with_zone("new", zone, ""),
            CallbackAction::SelectType(t) => format!("type{SEP}{}", t.as_str()),
            CallbackAction::SelectTtl(ttl) => format!("ttl{SEP}{ttl}"),
            CallbackAction::SelectProxied(p) => format!("prox{SEP}{p}"),
            CallbackAction::ConfirmCreate => "confirm".into(),
            CallbackAction::CancelCreate => "cancel".into(),
            CallbackAction::Back(target) => format!("back{SEP}{}", target.as_str()),
            CallbackAction::Page { zone, page } => with_zone("page", zone, &format!("{SEP}{page}")),
            CallbackAction::Refresh { zone } => with_zone("refresh", zone, ""),
            CallbackAction::ViewRecord { zone, page, row } => {
                with_zone("view", zone, &format!("{SEP}{page}{SEP}{row}"))
            }
            CallbackAction::EditRecord { zone, page, row, field } => with_zone(
                "edit",
                zone,
                &format!("{SEP}{page}{SEP}{row}{SEP}{}", field.as_str()),
            ),
            CallbackAction::EditTtlChoice(ttl) => format!("ettl{SEP}{ttl}"),
            CallbackAction::EditProxiedChoice(p) => format!("eprox{SEP}{p}"),
            CallbackAction::CancelEdit => "ecancel".into(),
            CallbackAction::DeleteRecord { zone, page, row } => {
                with_zone("del", zone, &format!("{SEP}{page}{SEP}{row}"))
            }
            CallbackAction::RequestAccess => "reqaccess".into(),
            CallbackAction::ApproveRequest(id) => format!("approve{SEP}{id}"),
            CallbackAction::RejectRequest(id) => format!("reject{SEP}{id}"),
            CallbackAction::Tokens => "tokens".into(),
            CallbackAction::TokenGenerate => "tokgen".into(),
            CallbackAction::TokenList => "toklist".into(),
            CallbackAction::TokenDeleteMenu => "tokdel".into(),
            CallbackAction::TokenDelete(index) => format!("tokrm{SEP}{index}"),
            CallbackAction::Noop => "noop".into(),
        }
    }

    pub fn parse(data: &str) -> Option<CallbackAction> {
        let (verb, rest) = match data.split_once(SEP) {
            Some((verb, rest)) => (verb, Some(rest)),
            None => (data, None),
        };

        match (verb, rest) {
            ("menu", None) => Some(CallbackAction::Menu),
            ("zones", None) => Some(CallbackAction::Zones),
            ("create", None) => Some(CallbackAction::Create),
            ("manage", None) => Some(CallbackAction::Manage),
            ("confirm", None) => Some(CallbackAction::ConfirmCreate),
            ("cancel", None) => Some(CallbackAction::CancelCreate),
            ("ecancel", None) => Some(CallbackAction::CancelEdit),
            ("reqaccess", None) => Some(CallbackAction::RequestAccess),
            ("tokens", None) => Some(CallbackAction::Tokens),
            ("tokgen", None) => Some(CallbackAction::TokenGenerate),
            ("toklist", None) => Some(CallbackAction::TokenList),
            ("tokdel", None) => Some(CallbackAction::TokenDeleteMenu),
            ("noop", None) => Some(CallbackAction::Noop),
            ("zc", Some(zone)) if !zone.is_empty() => {
                Some(CallbackAction::SelectZoneCreate(zone.to_string()))
            }
            ("zm", Some(zone)) if !zone.is_empty() => {
                Some(CallbackAction::SelectZoneManage(zone.to_string()))
            }
            ("new", Some(zone)) if !zone.is_empty() => {
                Some(CallbackAction::CreateInZone(zone.to_string()))
            }
            ("refresh", Some(zone)) if !zone.is_empty() => Some(CallbackAction::Refresh {
                zone: zone.to_string(),
            }),
            ("type", Some(t)) => RecordType::from_str(t).ok().map(CallbackAction::SelectType),
            ("ttl", Some(ttl)) => ttl.parse().ok().map(CallbackAction::SelectTtl),
            ("prox", Some(p)) => parse_bool(p).map(CallbackAction::SelectProxied),
            ("ettl", Some(ttl)) => ttl.parse().ok().map(CallbackAction::EditTtlChoice),
            ("eprox", Some(p)) => parse_bool(p).map(CallbackAction::EditProxiedChoice),
            ("back", Some(target)) => BackTarget::parse(target).map(CallbackAction::Back),
            ("approve", Some(id)) => id.parse().ok().map(CallbackAction::ApproveRequest),
            ("reject", Some(id)) => id.parse().ok().map(CallbackAction::RejectRequest),
            ("tokrm", Some(index)) => index.parse().ok().map(CallbackAction::TokenDelete),
            ("page", Some(rest)) => {
                let (zone, page) = rest.split_once(SEP)?;
                Some(CallbackAction::Page {
                    zone: zone.to_string(),
                    page: page.parse().ok()?,
                })
            }
            ("view", Some(rest)) => {
                let (zone, page, row) = split_address(rest)?;
                Some(CallbackAction::ViewRecord { zone, page, row })
            }
            ("del", Some(rest)) => {
                let (zone, page, row) = split_address(rest)?;
                Some(CallbackAction::DeleteRecord { zone, page, row })
            }
            ("edit", Some(rest)) => {
                let (zone, rest) = rest.split_once(SEP)?;
                let (page, rest) = rest.split_once(SEP)?;
                let (row, field) = rest.split_once(SEP)?;
                Some(CallbackAction::EditRecord {
                    zone: zone.to_string(),
                    page: page.parse().ok()?,
                    row: row.parse().ok()?,
                    field: EditField::parse(field)?,
                })
            }
            _ => None,
        }
    }
}

fn split_address(rest: &str) -> Option<(String, usize, usize)> {
    let (zone, rest) = rest.split_once(SEP)?;
    let (page, row) = rest.split_once(SEP)?;
    Some((zone.to_string(), page.parse().ok()?, row.parse().ok()?))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn with_zone(verb: &str, zone: &str, suffix: &str) -> String {
    let room = MAX_CALLBACK_BYTES.saturating_sub(verb.len() + 1 + suffix.len());
    format!("{verb}{SEP}{}{suffix}", truncate_zone(zone, room))
}

/// Longest zone-name prefix fitting in `max` bytes, on a char boundary.
fn truncate_zone(zone: &str, max: usize) -> &str {
    if zone.len() <= max {
        return zone;
    }
    let mut end = max;
    while end > 0 && !zone.is_char_boundary(end) {
        end -= 1;
    }
    &zone[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_for_short_zones() {
        let actions = [
            CallbackAction::Menu,
            CallbackAction::SelectZoneCreate("example.com".into()),
            CallbackAction::SelectType(RecordType::Aaaa),
            CallbackAction::SelectTtl(3600),
            CallbackAction::SelectProxied(false),
            CallbackAction::Back(BackTarget::InputContent),
            CallbackAction::Page {
                zone: "example.com".into(),
                page: 4,
            },
            CallbackAction::ViewRecord {
                zone: "example.com".into(),
                page: 2,
                row: 7,
            },
            CallbackAction::EditRecord {
                zone: "example.com".into(),
                page: 0,
                row: 3,
                field: EditField::Proxied,
            },
            CallbackAction::DeleteRecord {
                zone: "example.com".into(),
                page: 1,
                row: 0,
            },
            CallbackAction::ApproveRequest(123456789),
            CallbackAction::TokenDelete(2),
        ];

        for action in actions {
            let encoded = action.encode();
            assert!(encoded.len() <= MAX_CALLBACK_BYTES, "{encoded} too long");
            assert_eq!(CallbackAction::parse(&encoded), Some(action));
        }
    }

    #[test]
    fn oversized_zone_is_truncated_to_fit() {
        let zone = "a".repeat(100);
        let action = CallbackAction::ViewRecord {
            zone: zone.clone(),
            page: 12,
            row: 9,
        };
        let encoded = action.encode();
        assert!(encoded.len() <= MAX_CALLBACK_BYTES);

        // The page/row coordinates survive; the zone keeps its prefix.
        match CallbackAction::parse(&encoded) {
            Some(CallbackAction::ViewRecord {
                zone: decoded,
                page,
                row,
            }) => {
                assert_eq!(page, 12);
                assert_eq!(row, 9);
                assert!(zone.starts_with(&decoded));
                assert!(!decoded.is_empty());
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn garbage_payloads_do_not_parse() {
        for data in ["", "bogus", "view:onlyzone", "ttl:notanumber", "prox:maybe", "back:nowhere"] {
            assert_eq!(CallbackAction::parse(data), None, "{data:?}");
        }
    }
}
