use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

/// A closed name↔code table for one enumerated remote field.
///
/// Code `0` is the remote default and must always be present.
#[derive(Debug)]
pub struct EnumTable {
    pub field: &'static str,
    pub entries: &'static [(&'static str, i32)],
}

impl EnumTable {
    pub fn name_of(&self, code: i32) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(name, _)| *name)
    }

    pub fn code_of(&self, name: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, code)| *code)
    }

    /// Check the table is usable: a default entry, no duplicate names or codes.
    pub fn validate(&self) -> Result<(), String> {
        if self.name_of(0).is_none() {
            return Err(format!("{}: no entry for default code 0", self.field));
        }
        let mut names = HashSet::new();
        let mut codes = HashSet::new();
        for (name, code) in self.entries {
            if name.is_empty() {
                return Err(format!("{}: empty name for code {code}", self.field));
            }
            if !names.insert(*name) {
                return Err(format!("{}: duplicate name {name}", self.field));
            }
            if !codes.insert(*code) {
                return Err(format!("{}: duplicate code {code}", self.field));
            }
        }
        Ok(())
    }
}

pub static CLUSTER_TYPE: EnumTable = EnumTable {
    field: "type",
    entries: &[
        ("GENERIC_CLUSTER", 0),
        ("KUBERNETES_CLUSTER", 1),
        ("OPENSHIFT_CLUSTER", 2),
        ("OPENSHIFT4_CLUSTER", 5),
    ],
};

pub static COLLECTION_METHOD: EnumTable = EnumTable {
    field: "collectionMethod",
    entries: &[
        ("UNSET_COLLECTION", 0),
        ("NO_COLLECTION", 1),
        ("KERNEL_MODULE", 2),
        ("EBPF", 3),
        ("CORE_BPF", 4),
    ],
};

pub static MANAGER_TYPE: EnumTable = EnumTable {
    field: "managedBy",
    entries: &[
        ("MANAGER_TYPE_UNKNOWN", 0),
        ("MANAGER_TYPE_MANUAL", 1),
        ("MANAGER_TYPE_HELM_CHART", 2),
        ("MANAGER_TYPE_KUBERNETES_OPERATOR", 3),
    ],
};

/// Every table the mapper relies on.
pub static ALL_TABLES: [&EnumTable; 3] = [&CLUSTER_TYPE, &COLLECTION_METHOD, &MANAGER_TYPE];

/// An enum value as it may appear on the JSON wire: a number or a name.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireEnum {
    Code(i32),
    Name(String),
}

fn decode_code<'de, D>(table: &EnumTable, deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<WireEnum>::deserialize(deserializer)? {
        None => Ok(0),
        Some(WireEnum::Code(code)) => Ok(code),
        Some(WireEnum::Name(name)) => Ok(table.code_of(&name).unwrap_or_else(|| {
            tracing::warn!(field = table.field, name = %name, "unknown enum name from Central");
            -1
        })),
    }
}

pub(crate) fn cluster_type<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    decode_code(&CLUSTER_TYPE, d)
}

pub(crate) fn collection_method<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    decode_code(&COLLECTION_METHOD, d)
}

pub(crate) fn manager_type<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    decode_code(&MANAGER_TYPE, d)
}
