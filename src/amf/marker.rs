//! AMF0 type markers
//!
//! Reference: AMF0 File Format Specification, section 2.1.

/// Single-byte wire tag identifying the kind of the value that follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Marker {
    Number = 0x00,
    Boolean = 0x01,
    String = 0x02,
    Object = 0x03,
    /// Reserved, not supported
    MovieClip = 0x04,
    Null = 0x05,
    Undefined = 0x06,
    Reference = 0x07,
    EcmaArray = 0x08,
    ObjectEnd = 0x09,
    StrictArray = 0x0A,
    Date = 0x0B,
    /// 32-bit length string, not implemented
    LongString = 0x0C,
    /// Not implemented
    Unsupported = 0x0D,
    /// Reserved, not supported
    Recordset = 0x0E,
    /// Not implemented
    XmlDocument = 0x0F,
    TypedObject = 0x10,
    /// Switch to AMF3, not implemented
    AvmPlus = 0x11,
}

impl Marker {
    /// Map a wire byte to its marker
    pub fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            0x00 => Marker::Number,
            0x01 => Marker::Boolean,
            0x02 => Marker::String,
            0x03 => Marker::Object,
            0x04 => Marker::MovieClip,
            0x05 => Marker::Null,
            0x06 => Marker::Undefined,
            0x07 => Marker::Reference,
            0x08 => Marker::EcmaArray,
            0x09 => Marker::ObjectEnd,
            0x0A => Marker::StrictArray,
            0x0B => Marker::Date,
            0x0C => Marker::LongString,
            0x0D => Marker::Unsupported,
            0x0E => Marker::Recordset,
            0x0F => Marker::XmlDocument,
            0x10 => Marker::TypedObject,
            0x11 => Marker::AvmPlus,
            _ => return None,
        })
    }

    /// Wire byte for this marker
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether this codec reads and writes the marker's payload
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            Marker::MovieClip
                | Marker::LongString
                | Marker::Unsupported
                | Marker::Recordset
                | Marker::XmlDocument
                | Marker::AvmPlus
        )
    }

    /// Whether values with this marker enter the reference table
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            Marker::Object | Marker::EcmaArray | Marker::StrictArray | Marker::TypedObject
        )
    }
}

impl TryFrom<u8> for Marker {
    type Error = crate::error::AmfError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        Marker::from_u8(b).ok_or(crate::error::AmfError::MalformedTag(b))
    }
}
