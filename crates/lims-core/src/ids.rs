//! ID prefixes for every table with a generated primary key.
//!
//! IDs are generated in SQL as `{prefix}-{8 hex chars}`, e.g. `itm-1a2b3c4d`.

pub const PREFIX_MEASURE: &str = "msr";
pub const PREFIX_ITEM_TYPE: &str = "ityp";
pub const PREFIX_LOCATION: &str = "loc";
pub const PREFIX_SET: &str = "set";
pub const PREFIX_ITEM: &str = "itm";
pub const PREFIX_TRANSFER: &str = "xfr";
pub const PREFIX_TASK_TEMPLATE: &str = "tpl";
pub const PREFIX_INPUT_FIELD: &str = "inp";
pub const PREFIX_WORKFLOW: &str = "wfl";
pub const PREFIX_RUN: &str = "run";
pub const PREFIX_TASK_RUN: &str = "trn";
pub const PREFIX_DATA_ENTRY: &str = "ent";
pub const PREFIX_PRODUCT_STATUS: &str = "pst";
pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_PRODUCT: &str = "prd";
pub const PREFIX_PROJECT_LINK: &str = "plk";
pub const PREFIX_ATTACHMENT: &str = "att";
pub const PREFIX_CRM_ACCOUNT: &str = "cac";
pub const PREFIX_CRM_PROJECT: &str = "cpj";
pub const PREFIX_CRM_QUOTE: &str = "cqt";
pub const PREFIX_EQUIPMENT: &str = "eqp";
pub const PREFIX_RESERVATION: &str = "rsv";
pub const PREFIX_DATA_FILE: &str = "dfl";
pub const PREFIX_PRICE: &str = "prc";
pub const PREFIX_USER: &str = "usr";
pub const PREFIX_GROUP: &str = "grp";
pub const PREFIX_AUDIT: &str = "aud";

pub const ALL_PREFIXES: [&str; 27] = [
    PREFIX_MEASURE,
    PREFIX_ITEM_TYPE,
    PREFIX_LOCATION,
    PREFIX_SET,
    PREFIX_ITEM,
    PREFIX_TRANSFER,
    PREFIX_TASK_TEMPLATE,
    PREFIX_INPUT_FIELD,
    PREFIX_WORKFLOW,
    PREFIX_RUN,
    PREFIX_TASK_RUN,
    PREFIX_DATA_ENTRY,
    PREFIX_PRODUCT_STATUS,
    PREFIX_PROJECT,
    PREFIX_PRODUCT,
    PREFIX_PROJECT_LINK,
    PREFIX_ATTACHMENT,
    PREFIX_CRM_ACCOUNT,
    PREFIX_CRM_PROJECT,
    PREFIX_CRM_QUOTE,
    PREFIX_EQUIPMENT,
    PREFIX_RESERVATION,
    PREFIX_DATA_FILE,
    PREFIX_PRICE,
    PREFIX_USER,
    PREFIX_GROUP,
    PREFIX_AUDIT,
];
