//! L5X schema constants.
//!
//! Element ordering, the base type catalog, and the standard instruction
//! vocabulary. Everything here is data; nothing touches a document.

// ---------------------------------------------------------------------------
// Element ordering
// ---------------------------------------------------------------------------

/// Children of `<Controller>`, in the order Studio 5000 requires.
pub const CONTROLLER_CHILD_ORDER: &[&str] = &[
    "RedundancyInfo",
    "Security",
    "SafetyInfo",
    "DataTypes",
    "Modules",
    "AddOnInstructionDefinitions",
    "AlarmDefinitions",
    "Tags",
    "Programs",
    "Tasks",
    "CST",
    "WallClockTime",
    "Trends",
    "DataLogs",
    "TimeSynchronize",
    "EthernetPorts",
    "OpcUaInfo",
];

/// Children of `<Program>` that the merge engine creates.
pub const PROGRAM_CHILD_ORDER: &[&str] = &["Description", "Tags", "Routines"];

// ---------------------------------------------------------------------------
// Element and attribute names
// ---------------------------------------------------------------------------

pub const ROOT: &str = "RSLogix5000Content";
pub const CONTROLLER: &str = "Controller";
pub const DATA_TYPES: &str = "DataTypes";
pub const DATA_TYPE: &str = "DataType";
pub const AOI_DEFINITIONS: &str = "AddOnInstructionDefinitions";
pub const AOI_DEFINITION: &str = "AddOnInstructionDefinition";
pub const ALARM_DEFINITIONS: &str = "AlarmDefinitions";
pub const ALARM_DEFINITION: &str = "DatatypeAlarmDefinition";
pub const TAGS: &str = "Tags";
pub const TAG: &str = "Tag";
pub const PROGRAMS: &str = "Programs";
pub const PROGRAM: &str = "Program";
pub const ROUTINES: &str = "Routines";
pub const ROUTINE: &str = "Routine";
pub const RLL_CONTENT: &str = "RLLContent";
pub const ST_CONTENT: &str = "STContent";
pub const RUNG: &str = "Rung";

pub const USE_ATTR: &str = "Use";
pub const USE_TARGET: &str = "Target";
pub const USE_CONTEXT: &str = "Context";
pub const TARGET_TYPE_ATTR: &str = "TargetType";
pub const TARGET_NAME_ATTR: &str = "TargetName";
pub const DATA_TYPE_ATTR: &str = "DataType";

// ---------------------------------------------------------------------------
// Export defaults
// ---------------------------------------------------------------------------

/// `ExportOptions` written on every export root.
pub const DEFAULT_EXPORT_OPTIONS: &str =
    "NoRawData L5KData DecoratedData ForceProtectedEncoding AllProjDocTrans";

/// `strftime`-style format of the `ExportDate` root attribute
/// (`Mon Jan 06 14:03:12 2025`).
pub const EXPORT_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Format of AOI `EditedDate`/`CreatedDate` (UTC, millisecond precision).
pub const EDITED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Atomic data types.
pub const BASE_DATA_TYPES: &[&str] = &[
    "BOOL", "SINT", "USINT", "INT", "UINT", "DINT", "UDINT", "LINT", "REAL", "LREAL", "STRING",
];

/// Structures the controller provides without a `DataType` definition.
pub const BUILTIN_STRUCTURES: &[&str] = &["TIMER", "COUNTER", "CONTROL"];

/// `true` if `data_type` needs no definition in the project.
///
/// The comparison ignores ASCII case. `BIT` (the member type of bit-packed
/// booleans) counts as built in.
#[must_use]
pub fn is_base_or_builtin(data_type: &str) -> bool {
    data_type.eq_ignore_ascii_case("BIT")
        || BASE_DATA_TYPES
            .iter()
            .chain(BUILTIN_STRUCTURES)
            .any(|t| t.eq_ignore_ascii_case(data_type))
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Standard ladder instruction mnemonics. An instruction-like token that is
/// not in this list is a candidate Add-On Instruction call.
pub const INSTRUCTION_CATALOG: &[&str] = &[
    // bit
    "XIC", "XIO", "ONS", "OSR", "OSF", "OTE", "OTL", "OTU",
    // timer / counter
    "TON", "TOF", "RTO", "CTU", "CTD", "RES",
    // compare
    "EQU", "NEQ", "LES", "LEQ", "GRT", "GEQ", "CMP", "LIM", "MEQ",
    // math
    "ADD", "SUB", "MUL", "DIV", "MOD", "NEG", "ABS", "SQR", "CPT",
    // move / logical
    "MOV", "MVM", "BTD", "CLR", "AND", "OR", "XOR", "NOT", "BAND", "BOR", "BXOR", "BNOT",
    // file / array
    "COP", "FLL", "AVE", "SRT", "STD", "SIZE",
    // program control
    "JSR", "RET", "JMP", "LBL", "NOP", "AFI", "EOT", "SBR", "TND", "MCR", "FOR", "BRK",
    // conversion / string
    "TOD", "FRD", "TRN", "DTOS", "STOD", "UPPER", "LOWER", "CONCAT", "MID", "DELETE", "INSERT",
    "FIND",
    // system
    "MSG", "GSV", "SSV", "EVENT", "IOT", "UID", "UIE",
    // alarms
    "ALMD", "ALMA",
];

/// `true` if `mnemonic` is a standard instruction (ASCII case-insensitive).
#[must_use]
pub fn is_standard_instruction(mnemonic: &str) -> bool {
    INSTRUCTION_CATALOG
        .iter()
        .any(|i| i.eq_ignore_ascii_case(mnemonic))
}
