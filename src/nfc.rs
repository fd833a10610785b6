//! NFC provisioning message construction and NDEF encoding.
//!
//! The message sent on an NFC bump is a single MIME record whose body is
//! the provisioning values in Java-properties form.

use crate::error::{ProvisioningError, ProvisioningResult};
use crate::host::Capabilities;
use crate::keys;
use crate::properties::{Escaping, Properties};
use crate::values::ProvisioningValues;
use chrono::{DateTime, Local};
use tracing::debug;

/// Default header comment of the payload body.
pub const DEFAULT_NFC_COMMENT: &str = "NFC provisioning";

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

/// Type name format of an NDEF record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tnf {
    Empty,
    WellKnown,
    MimeMedia,
    AbsoluteUri,
    External,
    Unknown,
    Unchanged,
}

impl Tnf {
    fn to_bits(self) -> u8 {
        match self {
            Tnf::Empty => 0x00,
            Tnf::WellKnown => 0x01,
            Tnf::MimeMedia => 0x02,
            Tnf::AbsoluteUri => 0x03,
            Tnf::External => 0x04,
            Tnf::Unknown => 0x05,
            Tnf::Unchanged => 0x06,
        }
    }

    fn from_bits(bits: u8) -> ProvisioningResult<Self> {
        match bits {
            0x00 => Ok(Tnf::Empty),
            0x01 => Ok(Tnf::WellKnown),
            0x02 => Ok(Tnf::MimeMedia),
            0x03 => Ok(Tnf::AbsoluteUri),
            0x04 => Ok(Tnf::External),
            0x05 => Ok(Tnf::Unknown),
            0x06 => Ok(Tnf::Unchanged),
            other => Err(ProvisioningError::ndef(format!("reserved TNF {:#04x}", other))),
        }
    }
}

/// One NDEF record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefRecord {
    pub tnf: Tnf,
    pub record_type: Vec<u8>,
    pub id: Vec<u8>,
    pub payload: Vec<u8>,
}

impl NdefRecord {
    /// Build a MIME record. The MIME type is normalized to lower case and
    /// must have the `type/subtype` shape.
    pub fn create_mime(mime_type: &str, payload: Vec<u8>) -> ProvisioningResult<Self> {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        let valid = mime_type
            .split_once('/')
            .is_some_and(|(kind, subtype)| !kind.is_empty() && !subtype.is_empty());
        if !valid {
            return Err(ProvisioningError::ndef(format!(
                "invalid MIME type '{}'",
                mime_type
            )));
        }
        Ok(Self {
            tnf: Tnf::MimeMedia,
            record_type: mime_type.into_bytes(),
            id: Vec::new(),
            payload,
        })
    }

    /// MIME type of a MIME record.
    pub fn mime_type(&self) -> Option<String> {
        (self.tnf == Tnf::MimeMedia).then(|| String::from_utf8_lossy(&self.record_type).into_owned())
    }

    fn encode_into(&self, out: &mut Vec<u8>, first: bool, last: bool) -> ProvisioningResult<()> {
        if self.record_type.len() > u8::MAX as usize || self.id.len() > u8::MAX as usize {
            return Err(ProvisioningError::ndef("record type or id longer than 255 bytes"));
        }
        let payload_len = u32::try_from(self.payload.len())
            .map_err(|_| ProvisioningError::ndef("payload too large"))?;
        let short = payload_len <= u8::MAX as u32;

        let mut header = self.tnf.to_bits();
        if first {
            header |= FLAG_MB;
        }
        if last {
            header |= FLAG_ME;
        }
        if short {
            header |= FLAG_SR;
        }
        if !self.id.is_empty() {
            header |= FLAG_IL;
        }

        out.push(header);
        out.push(self.record_type.len() as u8);
        if short {
            out.push(payload_len as u8);
        } else {
            out.extend_from_slice(&payload_len.to_be_bytes());
        }
        if !self.id.is_empty() {
            out.push(self.id.len() as u8);
        }
        out.extend_from_slice(&self.record_type);
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.payload);
        Ok(())
    }
}

/// A non-empty sequence of NDEF records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefMessage {
    records: Vec<NdefRecord>,
}

impl NdefMessage {
    pub fn new(records: Vec<NdefRecord>) -> ProvisioningResult<Self> {
        if records.is_empty() {
            return Err(ProvisioningError::ndef("message has no records"));
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[NdefRecord] {
        &self.records
    }

    pub fn to_bytes(&self) -> ProvisioningResult<Vec<u8>> {
        let mut out = Vec::new();
        let last = self.records.len() - 1;
        for (i, record) in self.records.iter().enumerate() {
            record.encode_into(&mut out, i == 0, i == last)?;
        }
        Ok(out)
    }

    /// Parse an encoded message. Chunked records are not supported.
    pub fn parse(bytes: &[u8]) -> ProvisioningResult<Self> {
        let mut reader = ByteReader { bytes, pos: 0 };
        let mut records = Vec::new();

        loop {
            let header = reader.u8()?;
            if records.is_empty() && header & FLAG_MB == 0 {
                return Err(ProvisioningError::ndef("first record lacks the message-begin flag"));
            }
            if !records.is_empty() && header & FLAG_MB != 0 {
                return Err(ProvisioningError::ndef("message-begin flag on a later record"));
            }
            if header & FLAG_CF != 0 {
                return Err(ProvisioningError::ndef("chunked records are not supported"));
            }

            let tnf = Tnf::from_bits(header & TNF_MASK)?;
            let type_len = reader.u8()? as usize;
            let payload_len = if header & FLAG_SR != 0 {
                reader.u8()? as usize
            } else {
                u32::from_be_bytes(reader.array::<4>()?) as usize
            };
            let id_len = if header & FLAG_IL != 0 {
                reader.u8()? as usize
            } else {
                0
            };

            let record_type = reader.take(type_len)?.to_vec();
            let id = reader.take(id_len)?.to_vec();
            let payload = reader.take(payload_len)?.to_vec();
            records.push(NdefRecord {
                tnf,
                record_type,
                id,
                payload,
            });

            if header & FLAG_ME != 0 {
                break;
            }
        }

        if reader.pos != bytes.len() {
            return Err(ProvisioningError::ndef(format!(
                "{} trailing bytes after message end",
                bytes.len() - reader.pos
            )));
        }
        Self::new(records)
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, len: usize) -> ProvisioningResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| ProvisioningError::ndef("message truncated"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> ProvisioningResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> ProvisioningResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

/// Wrap an SSID in double quotes unless it already is.
pub fn quote_ssid(ssid: &str) -> String {
    if ssid.starts_with('"') && ssid.ends_with('"') {
        ssid.to_string()
    } else {
        format!("\"{}\"", ssid)
    }
}

/// Builds the message sent on an NFC bump.
#[derive(Debug, Clone)]
pub struct NfcMessageBuilder {
    comment: String,
    capabilities: Capabilities,
}

impl NfcMessageBuilder {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            comment: DEFAULT_NFC_COMMENT.to_string(),
            capabilities,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// The properties the payload body carries at time `now`.
    pub fn build_properties(&self, values: &ProvisioningValues, now: DateTime<Local>) -> Properties {
        let has_component = values
            .get(keys::DEVICE_ADMIN_COMPONENT_NAME)
            .is_some_and(|c| !c.is_empty());
        let mut props = Properties::new();

        for (key, value) in values.iter() {
            if value.is_empty() || key == keys::LOADED_FILENAME {
                continue;
            }
            if key == keys::DEVICE_ADMIN_PACKAGE_NAME
                && self.capabilities.admin_component
                && has_component
            {
                // The component supersedes the package on these platforms.
                continue;
            }
            let value = if key == keys::WIFI_SSID {
                quote_ssid(value)
            } else {
                value.to_string()
            };
            props.insert(key, value);
        }

        // Some devices need the local time to fetch the admin app over HTTPS.
        if !props.contains_key(keys::LOCAL_TIME) {
            props.insert(keys::LOCAL_TIME, now.timestamp_millis().to_string());
        }
        props
    }

    /// Build the message for `values`, or `None` when nothing is loaded.
    pub fn create_ndef_message(
        &self,
        values: Option<&ProvisioningValues>,
    ) -> ProvisioningResult<Option<NdefMessage>> {
        self.create_ndef_message_at(values, Local::now())
    }

    pub fn create_ndef_message_at(
        &self,
        values: Option<&ProvisioningValues>,
        now: DateTime<Local>,
    ) -> ProvisioningResult<Option<NdefMessage>> {
        let Some(values) = values else {
            debug!("No provisioning values loaded, no NFC message");
            return Ok(None);
        };
        let props = self.build_properties(values, now);
        let body = props.store_at(Some(&self.comment), Escaping::Ascii, now);
        let record = NdefRecord::create_mime(keys::MIME_TYPE_PROVISIONING_NFC, body.into_bytes())?;
        debug!(entries = props.len(), "Built NFC provisioning message");
        NdefMessage::new(vec![record]).map(Some)
    }
}

/// Read the provisioning properties back out of a message.
pub fn decode_provisioning_message(message: &NdefMessage) -> ProvisioningResult<Properties> {
    let record = message
        .records()
        .iter()
        .find(|r| r.mime_type().as_deref() == Some(keys::MIME_TYPE_PROVISIONING_NFC))
        .ok_or_else(|| ProvisioningError::ndef("no provisioning record in message"))?;
    Properties::load_latin1(&record.payload)
}
