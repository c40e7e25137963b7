#[derive(Clone, Debug)]
pub struct StaticConfigItem {
    pub key: &'static str,
    pub description: &'static str,
    pub value_type: &'static str,
    pub default_value: &'static str,
    pub env: Option<&'static str>,
}

pub static STATIC_CONFIG_TABLE: &[StaticConfigItem] = &[
    StaticConfigItem {
        key: "server.host",
        description: "Address the inventory API binds to",
        value_type: "string",
        default_value: "0.0.0.0",
        env: Some("HOST"),
    },
    StaticConfigItem {
        key: "server.port",
        description: "Port the inventory API listens on",
        value_type: "number",
        default_value: "8080",
        env: Some("PORT"),
    },
    StaticConfigItem {
        key: "server.max_body_bytes",
        description: "Upper bound on create/update request bodies",
        value_type: "number",
        default_value: "65536",
        env: None,
    },
    StaticConfigItem {
        key: "storage.sqlite_path",
        description: "SQLite database path",
        value_type: "string",
        default_value: "./lab_gear.db",
        env: Some("DB_PATH"),
    },
    StaticConfigItem {
        key: "security.api_token",
        description: "Shared bearer token required on /api/v1 routes",
        value_type: "string",
        default_value: "",
        env: Some("API_TOKEN"),
    },
];
