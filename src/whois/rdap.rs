//! Render RDAP network documents as WHOIS-style text

use chrono::DateTime;
use serde_json::Value;

/// Column at which values start, label and colon included.
///
/// Viewers align on this, so it must not change.
pub const LABEL_WIDTH: usize = 17;

/// Entity roles rendered as contact blocks, in output order
const CONTACT_ROLES: [ContactRole; 3] = [
    ContactRole {
        role: "registrant",
        name: "OrgName",
        handle: "OrgId",
        phone: "OrgPhone",
        email: "OrgEmail",
        reference: "Ref",
    },
    ContactRole {
        role: "technical",
        name: "OrgTechName",
        handle: "OrgTechHandle",
        phone: "OrgTechPhone",
        email: "OrgTechEmail",
        reference: "OrgTechRef",
    },
    ContactRole {
        role: "abuse",
        name: "OrgAbuseName",
        handle: "OrgAbuseHandle",
        phone: "OrgAbusePhone",
        email: "OrgAbuseEmail",
        reference: "OrgAbuseRef",
    },
];

struct ContactRole {
    role: &'static str,
    name: &'static str,
    handle: &'static str,
    phone: &'static str,
    email: &'static str,
    reference: &'static str,
}

/// Accumulates `Label: value` lines, dropping empty values
#[derive(Default)]
struct WhoisWriter {
    out: String,
}

impl WhoisWriter {
    /// One labelled line per non-blank line of `value`
    fn field(&mut self, label: &str, value: Option<impl AsRef<str>>) {
        let Some(value) = value else { return };
        let label = format!("{label}:");
        for line in value.as_ref().lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.out
                .push_str(&format!("{:<width$} {}\n", label, line, width = LABEL_WIDTH));
        }
    }

    fn remarks(&mut self, node: &Value) {
        for remark in array(node, "remarks") {
            self.field("Comment", str_field(remark, "title"));
            for line in array(remark, "description") {
                self.field("Comment", line.as_str());
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.out.is_empty()
    }
}

/// Convert an RDAP IP network document into WHOIS text.
///
/// Fields absent from the document produce no line at all. The document is
/// only read.
pub fn format_rdap_to_whois(rdap: &Value) -> String {
    let mut w = WhoisWriter::default();

    let net_range = match (
        str_field(rdap, "startAddress"),
        str_field(rdap, "endAddress"),
    ) {
        (Some(start), Some(end)) => Some(format!("{start} - {end}")),
        _ => None,
    };
    w.field("NetRange", net_range);
    w.field("CIDR", cidrs(rdap));
    w.field("NetName", str_field(rdap, "name"));
    w.field("NetHandle", str_field(rdap, "handle"));
    w.field("Parent", str_field(rdap, "parentHandle"));
    w.field("NetType", str_field(rdap, "type"));
    w.field("OriginAS", origin_as(rdap));
    w.field(
        "Organization",
        find_entity(rdap, "registrant").and_then(|e| vcard_text(e, "fn")),
    );
    w.field("RegDate", event_date(rdap, "registration"));
    w.field("Updated", event_date(rdap, "last changed"));
    w.field("Ref", self_link(rdap));
    w.remarks(rdap);

    for contact in &CONTACT_ROLES {
        let Some(entity) = find_entity(rdap, contact.role) else {
            continue;
        };
        let block = contact_block(entity, contact);
        if !block.is_empty() {
            w.out.push('\n');
            w.out.push_str(&block.out);
        }
    }

    w.out.trim().to_string()
}

fn contact_block(entity: &Value, contact: &ContactRole) -> WhoisWriter {
    let mut w = WhoisWriter::default();

    w.field(contact.name, vcard_text(entity, "fn"));
    w.field(contact.handle, str_field(entity, "handle"));
    address(&mut w, entity);
    w.field("RegDate", event_date(entity, "registration"));
    w.field("Updated", event_date(entity, "last changed"));
    w.remarks(entity);
    w.field(
        contact.phone,
        vcard_text(entity, "tel").map(|t| t.trim_start_matches("tel:").to_string()),
    );
    w.field(contact.email, vcard_text(entity, "email"));
    w.field(contact.reference, self_link(entity));

    w
}

/// vCard `adr`: structured components when present, else the label lines
fn address(w: &mut WhoisWriter, entity: &Value) {
    let Some(adr) = vcard_property(entity, "adr") else {
        return;
    };

    let parts = adr.get(3).and_then(Value::as_array);
    let component = |i: usize| -> Option<String> {
        match parts?.get(i)? {
            Value::String(s) => Some(s.clone()),
            Value::Array(lines) => Some(
                lines
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        }
    };

    let structured = [
        ("Address", component(2)),
        ("City", component(3)),
        ("StateProv", component(4)),
        ("PostalCode", component(5)),
        ("Country", component(6)),
    ];

    if structured
        .iter()
        .any(|(_, v)| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    {
        for (label, value) in structured {
            w.field(label, value);
        }
        return;
    }

    let label = adr.get(1).and_then(|p| p.get("label")).and_then(Value::as_str);
    w.field("Address", label);
}

fn str_field<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str)
}

fn array<'a>(node: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    node.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn cidrs(rdap: &Value) -> Option<String> {
    let list: Vec<String> = array(rdap, "cidr0_cidrs")
        .filter_map(|c| {
            let prefix = str_field(c, "v4prefix").or_else(|| str_field(c, "v6prefix"))?;
            let length = c.get("length")?.as_u64()?;
            Some(format!("{prefix}/{length}"))
        })
        .collect();
    (!list.is_empty()).then(|| list.join(", "))
}

fn origin_as(rdap: &Value) -> Option<String> {
    let mut list: Vec<String> = array(rdap, "arin_originas0_originautnums")
        .filter_map(|n| match n {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    list.extend(array(rdap, "autnums").filter_map(|a| str_field(a, "handle").map(str::to_string)));

    let list: Vec<String> = list
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            if s.to_ascii_uppercase().starts_with("AS") {
                s
            } else {
                format!("AS{s}")
            }
        })
        .collect();
    (!list.is_empty()).then(|| list.join(", "))
}

/// `eventDate` of the first event with the given action, as `YYYY-MM-DD`
fn event_date(node: &Value, action: &str) -> Option<String> {
    let raw = array(node, "events")
        .find(|e| str_field(e, "eventAction") == Some(action))
        .and_then(|e| str_field(e, "eventDate"))?;

    Some(match DateTime::parse_from_rfc3339(raw) {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => raw.to_string(),
    })
}

fn self_link(node: &Value) -> Option<&str> {
    array(node, "links")
        .find(|l| str_field(l, "rel") == Some("self"))
        .and_then(|l| str_field(l, "href"))
}

/// Depth-first search for the first entity carrying `role`
fn find_entity<'a>(node: &'a Value, role: &str) -> Option<&'a Value> {
    for entity in array(node, "entities") {
        if array(entity, "roles").any(|r| r.as_str() == Some(role)) {
            return Some(entity);
        }
        if let Some(found) = find_entity(entity, role) {
            return Some(found);
        }
    }
    None
}

/// The `[name, params, type, value]` vCard property named `name`
fn vcard_property<'a>(entity: &'a Value, name: &str) -> Option<&'a Vec<Value>> {
    entity
        .get("vcardArray")?
        .get(1)?
        .as_array()?
        .iter()
        .filter_map(Value::as_array)
        .find(|prop| prop.first().and_then(Value::as_str) == Some(name))
}

fn vcard_text(entity: &Value, name: &str) -> Option<String> {
    vcard_property(entity, name)?
        .get(3)?
        .as_str()
        .map(str::to_string)
}
