//! Result codes carried in the second part of every RPC reply.

use std::fmt;

/// Numeric RPC result code.
///
/// Stored as received (4-byte big-endian on the wire). Zero means success,
/// everything else is a server-side failure described by [`ResultCode::description`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const OK: ResultCode = ResultCode(0);
    pub const INVALID_COMMAND: ResultCode = ResultCode(1);
    pub const INVALID_PARAMETERS: ResultCode = ResultCode(2);
    pub const INVALID_NUM_PARAMETERS: ResultCode = ResultCode(3);
    pub const OBJECT_NOT_FOUND: ResultCode = ResultCode(4);
    pub const CREATE_FAILED: ResultCode = ResultCode(5);
    pub const MOTE_NOT_FOUND: ResultCode = ResultCode(6);
    pub const PATH_NOT_FOUND: ResultCode = ResultCode(7);
    pub const LINK_NOT_FOUND: ResultCode = ResultCode(8);
    pub const DELETE_FAILED: ResultCode = ResultCode(9);
    pub const JOIN_FAILED: ResultCode = ResultCode(10);
    pub const SEND_FAILED: ResultCode = ResultCode(11);
    pub const MOTE_CONNECT_ERROR: ResultCode = ResultCode(12);
    pub const GET_ROUTE_ERROR: ResultCode = ResultCode(13);
    pub const AP_NOT_FOUND: ResultCode = ResultCode(14);
    pub const USER_NOT_FOUND: ResultCode = ResultCode(15);
    pub const USER_EXISTS: ResultCode = ResultCode(16);
    pub const ENTRY_NOT_FOUND: ResultCode = ResultCode(17);
    pub const MOTE_NOT_AP: ResultCode = ResultCode(18);
    pub const TIMEOUT: ResultCode = ResultCode(19);
    pub const INVALID_JOINKEY: ResultCode = ResultCode(20);
    pub const AP_EXISTS: ResultCode = ResultCode(21);
    pub const SERVICE_NOT_AVAILABLE: ResultCode = ResultCode(22);
    pub const MOTE_STATE: ResultCode = ResultCode(23);
    pub const CMD_OUTPUT_QUEUE_FULL: ResultCode = ResultCode(24);
    pub const INVALID_AUTHENTICATION: ResultCode = ResultCode(25);
    pub const CLIENT_NOT_FOUND: ResultCode = ResultCode(26);
    pub const CLIENT_EXISTS: ResultCode = ResultCode(27);
    pub const ACCESSTOKEN_NOT_FOUND: ResultCode = ResultCode(28);
    pub const ACCESSTOKEN_EXISTS: ResultCode = ResultCode(29);
    pub const REQUESTTOKEN_NOT_FOUND: ResultCode = ResultCode(30);
    pub const CMD_IN_PROGRESS: ResultCode = ResultCode(31);
    pub const INVALID_CMD_SIGNATURE: ResultCode = ResultCode(32);
    pub const INVALID_SERVICE_ID: ResultCode = ResultCode(33);
    pub const DB_ERROR: ResultCode = ResultCode(34);
    pub const NOT_AUTHORIZED: ResultCode = ResultCode(35);
    pub const WD_STATE: ResultCode = ResultCode(36);
    pub const WD_CLIENT_STATE: ResultCode = ResultCode(37);
    pub const WD_NOTFOUND: ResultCode = ResultCode(38);
    pub const WD_CLIENT_TYPE: ResultCode = ResultCode(39);
    pub const PARSE: ResultCode = ResultCode(40);

    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }

    /// Codes that report a busy or temporarily unavailable server.
    pub fn is_retryable(&self) -> bool {
        matches!(
            *self,
            Self::TIMEOUT
                | Self::SERVICE_NOT_AVAILABLE
                | Self::CMD_OUTPUT_QUEUE_FULL
                | Self::CMD_IN_PROGRESS
        )
    }

    pub fn description(&self) -> &'static str {
        match self.0 {
            0 => "OK",
            1 => "Invalid command",
            2 => "Invalid parameters",
            3 => "Invalid number of parameters",
            4 => "Object not found",
            5 => "Create object failed",
            6 => "Mote or AP not found",
            7 => "Path not found",
            8 => "Link not found",
            9 => "Delete object failed",
            10 => "Join event failed",
            11 => "Send command failed",
            12 => "Mote or AP connection error",
            13 => "Get route error",
            14 => "Access point not found",
            15 => "User not found",
            16 => "User exists",
            17 => "Entry not found",
            18 => "Mote is not an AP",
            19 => "Timeout",
            20 => "Invalid join key value",
            21 => "Access point exists",
            22 => "RPC service not available",
            23 => "Mote or AP is in the wrong state",
            24 => "Command output queue is full",
            25 => "Invalid authentication",
            26 => "Client not found",
            27 => "Client exists",
            28 => "Access token not found",
            29 => "Access token exists",
            30 => "Request token not found",
            31 => "Command in progress",
            32 => "Invalid command signature",
            33 => "Invalid service id",
            34 => "Database error",
            35 => "User is not authorized",
            36 => "Wrong watchdog state",
            37 => "Wrong WD-client state",
            38 => "WD-client not found",
            39 => "Type of WD-client incompatible with requested command",
            40 => "RPC parse error",
            _ => "Unknown result code",
        }
    }
}

impl From<u32> for ResultCode {
    fn from(code: u32) -> Self {
        ResultCode(code)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.description())
    }
}
