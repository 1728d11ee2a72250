//! AMF0 value types
//!
//! Composite values (objects, ECMA arrays, strict arrays) are shared handles.
//! Cloning an `AmfValue` clones the handle, not the contents, so the same
//! instance can appear under several keys and the encoder can tell a shared
//! instance apart from a structurally equal copy.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::marker::Marker;

/// Shared handle to an object (plain or typed)
pub type ObjectRef = Rc<RefCell<AmfObject>>;

/// Shared handle to an ECMA array
pub type EcmaArrayRef = Rc<RefCell<EcmaArray>>;

/// Shared handle to a strict array
pub type ArrayRef = Rc<RefCell<Vec<AmfValue>>>;

/// AMF0 value
///
/// `PartialEq` compares structurally. Use [`AmfValue::ptr_eq`] to compare
/// composite identity. Comparing or debug-printing a value that contains
/// itself does not terminate.
#[derive(Debug, Clone, PartialEq)]
pub enum AmfValue {
    /// IEEE 754 double-precision floating point (0x00)
    Number(f64),

    /// Boolean value (0x01)
    Boolean(bool),

    /// UTF-8 string, at most 65535 encoded bytes (0x02)
    String(String),

    /// Null value (0x05)
    Null,

    /// Undefined value (0x06)
    Undefined,

    /// Key-value object (0x03), or typed object (0x10) when it carries a
    /// class name
    Object(ObjectRef),

    /// Associative array with an advisory count (0x08)
    EcmaArray(EcmaArrayRef),

    /// Dense array with an authoritative count (0x0A)
    StrictArray(ArrayRef),

    /// Milliseconds since Unix epoch plus the reserved timezone field (0x0B)
    Date { millis: f64, timezone: i16 },

    /// Object body terminator (0x09)
    ObjectEnd,
}

/// Object properties in insertion order, plus the class name of a typed object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmfObject {
    class_name: Option<String>,
    properties: IndexMap<String, AmfValue>,
}

impl AmfObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty typed object
    pub fn typed(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            properties: IndexMap::new(),
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, class_name: Option<String>) {
        self.class_name = class_name;
    }

    /// Insert a property, keeping the original position of an existing key
    pub fn insert(&mut self, key: impl Into<String>, value: AmfValue) -> Option<AmfValue> {
        self.properties.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&AmfValue> {
        self.properties.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<AmfValue> {
        self.properties.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AmfValue)> {
        self.properties.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, AmfValue)> for AmfObject {
    fn from_iter<I: IntoIterator<Item = (K, AmfValue)>>(iter: I) -> Self {
        Self {
            class_name: None,
            properties: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Key of an ECMA array entry
///
/// Keys that spell a canonical array index (`"0"`, `"42"`, no sign, no
/// leading zeros, below `u32::MAX`) are indices; everything else is a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Index(u32),
    Name(String),
}

impl ArrayKey {
    pub fn parse(key: &str) -> Self {
        let canonical = !key.is_empty()
            && key.bytes().all(|b| b.is_ascii_digit())
            && (key == "0" || !key.starts_with('0'));
        if canonical {
            if let Ok(index) = key.parse::<u32>() {
                if index != u32::MAX {
                    return ArrayKey::Index(index);
                }
            }
        }
        ArrayKey::Name(key.to_string())
    }

    /// Key as written on the wire
    pub fn as_wire_str(&self) -> Cow<'_, str> {
        match self {
            ArrayKey::Index(i) => Cow::Owned(i.to_string()),
            ArrayKey::Name(name) => Cow::Borrowed(name),
        }
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wire_str())
    }
}

impl From<&str> for ArrayKey {
    fn from(key: &str) -> Self {
        ArrayKey::parse(key)
    }
}

impl From<String> for ArrayKey {
    fn from(key: String) -> Self {
        ArrayKey::parse(&key)
    }
}

impl From<u32> for ArrayKey {
    fn from(index: u32) -> Self {
        ArrayKey::Index(index)
    }
}

/// ECMA array: indexed and named entries in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EcmaArray {
    entries: IndexMap<ArrayKey, AmfValue>,
    /// Highest index + 1
    dense_len: usize,
}

impl EcmaArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<ArrayKey>, value: AmfValue) -> Option<AmfValue> {
        let key = key.into();
        if let ArrayKey::Index(i) = key {
            self.dense_len = self.dense_len.max((i as usize).saturating_add(1));
        }
        self.entries.insert(key, value)
    }

    /// Append at index `len()`
    ///
    /// Past the last representable index (`u32::MAX - 1`) the value is
    /// stored under the named key `"4294967295"`, as a decoder would read it.
    pub fn push(&mut self, value: AmfValue) {
        let key = match u32::try_from(self.dense_len) {
            Ok(index) if index != u32::MAX => ArrayKey::Index(index),
            _ => ArrayKey::Name(self.dense_len.to_string()),
        };
        self.insert(key, value);
    }

    /// Look up by wire key; `"3"` finds index 3
    pub fn get(&self, key: &str) -> Option<&AmfValue> {
        self.entries.get(&ArrayKey::parse(key))
    }

    pub fn get_index(&self, index: u32) -> Option<&AmfValue> {
        self.entries.get(&ArrayKey::Index(index))
    }

    /// Dense length: highest index + 1, or 0 with no indexed entries
    pub fn len(&self) -> usize {
        self.dense_len
    }

    /// Number of entries, indexed and named
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &AmfValue)> {
        self.entries.iter()
    }

    /// Named (non-index) entries in insertion order
    pub fn named(&self) -> impl Iterator<Item = (&str, &AmfValue)> {
        self.entries.iter().filter_map(|(k, v)| match k {
            ArrayKey::Name(name) => Some((name.as_str(), v)),
            ArrayKey::Index(_) => None,
        })
    }
}

impl<K: Into<ArrayKey>> FromIterator<(K, AmfValue)> for EcmaArray {
    fn from_iter<I: IntoIterator<Item = (K, AmfValue)>>(iter: I) -> Self {
        let mut arr = Self::new();
        for (key, value) in iter {
            arr.insert(key, value);
        }
        arr
    }
}

impl AmfValue {
    /// New object from key-value pairs
    pub fn object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, AmfValue)>,
    {
        AmfValue::Object(Rc::new(RefCell::new(properties.into_iter().collect())))
    }

    /// New typed object from a class name and key-value pairs
    pub fn typed_object<K, I>(class_name: impl Into<String>, properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, AmfValue)>,
    {
        let mut obj: AmfObject = properties.into_iter().collect();
        obj.set_class_name(Some(class_name.into()));
        AmfValue::Object(Rc::new(RefCell::new(obj)))
    }

    /// New ECMA array from key-value pairs
    pub fn ecma_array<K, I>(entries: I) -> Self
    where
        K: Into<ArrayKey>,
        I: IntoIterator<Item = (K, AmfValue)>,
    {
        AmfValue::EcmaArray(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    /// New strict array
    pub fn strict_array(elements: Vec<AmfValue>) -> Self {
        AmfValue::StrictArray(Rc::new(RefCell::new(elements)))
    }

    /// New date with a zero timezone field
    pub fn date(millis: f64) -> Self {
        AmfValue::Date { millis, timezone: 0 }
    }

    /// Marker this value is written with when no explicit marker is given
    pub fn marker(&self) -> Marker {
        match self {
            AmfValue::Number(_) => Marker::Number,
            AmfValue::Boolean(_) => Marker::Boolean,
            AmfValue::String(_) => Marker::String,
            AmfValue::Null => Marker::Null,
            AmfValue::Undefined => Marker::Undefined,
            AmfValue::Object(obj) => {
                if obj.borrow().class_name.is_some() {
                    Marker::TypedObject
                } else {
                    Marker::Object
                }
            }
            AmfValue::EcmaArray(_) => Marker::EcmaArray,
            AmfValue::StrictArray(_) => Marker::StrictArray,
            AmfValue::Date { .. } => Marker::Date,
            AmfValue::ObjectEnd => Marker::ObjectEnd,
        }
    }

    /// Address of the shared composite, `None` for scalars
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            AmfValue::Object(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            AmfValue::EcmaArray(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            AmfValue::StrictArray(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            _ => None,
        }
    }

    /// Whether this is an object, ECMA array or strict array
    pub fn is_composite(&self) -> bool {
        self.identity().is_some()
    }

    /// Whether both values are the same composite instance
    pub fn ptr_eq(&self, other: &AmfValue) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Try to get this value as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AmfValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AmfValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AmfValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            AmfValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Try to get this value as an ECMA array handle
    pub fn as_ecma_array(&self) -> Option<&EcmaArrayRef> {
        match self {
            AmfValue::EcmaArray(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to get this value as a strict array handle
    pub fn as_strict_array(&self) -> Option<&ArrayRef> {
        match self {
            AmfValue::StrictArray(arr) => Some(arr),
            _ => None,
        }
    }

    /// Class name of a typed object
    pub fn class_name(&self) -> Option<String> {
        self.as_object()?.borrow().class_name.clone()
    }

    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, AmfValue::Null | AmfValue::Undefined)
    }

    /// Get a property from an object or ECMA array value
    ///
    /// Returns a clone; for composite members that is the shared handle.
    pub fn get(&self, key: &str) -> Option<AmfValue> {
        match self {
            AmfValue::Object(obj) => obj.borrow().get(key).cloned(),
            AmfValue::EcmaArray(arr) => arr.borrow().get(key).cloned(),
            _ => None,
        }
    }

    /// Get a string property from an object value
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            AmfValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a number property from an object value
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_number()
    }

    /// Get a boolean property from an object value
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }
}

impl Default for AmfValue {
    fn default() -> Self {
        AmfValue::Null
    }
}

impl From<bool> for AmfValue {
    fn from(v: bool) -> Self {
        AmfValue::Boolean(v)
    }
}

impl From<f64> for AmfValue {
    fn from(v: f64) -> Self {
        AmfValue::Number(v)
    }
}

impl From<i32> for AmfValue {
    fn from(v: i32) -> Self {
        AmfValue::Number(v as f64)
    }
}

impl From<u32> for AmfValue {
    fn from(v: u32) -> Self {
        AmfValue::Number(v as f64)
    }
}

impl From<String> for AmfValue {
    fn from(v: String) -> Self {
        AmfValue::String(v)
    }
}

impl From<&str> for AmfValue {
    fn from(v: &str) -> Self {
        AmfValue::String(v.to_string())
    }
}

impl From<AmfObject> for AmfValue {
    fn from(v: AmfObject) -> Self {
        AmfValue::Object(Rc::new(RefCell::new(v)))
    }
}

impl From<EcmaArray> for AmfValue {
    fn from(v: EcmaArray) -> Self {
        AmfValue::EcmaArray(Rc::new(RefCell::new(v)))
    }
}

impl<V: Into<AmfValue>> From<Vec<V>> for AmfValue {
    fn from(v: Vec<V>) -> Self {
        AmfValue::strict_array(v.into_iter().map(|x| x.into()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        let s = AmfValue::String("test".into());
        assert_eq!(s.as_str(), Some("test"));
        assert_eq!(s.as_number(), None);

        let n = AmfValue::Number(42.0);
        assert_eq!(n.as_number(), Some(42.0));
        assert_eq!(n.as_str(), None);

        let o = AmfValue::object([("key", AmfValue::from("value"))]);
        assert_eq!(o.get_string("key"), Some("value".to_string()));
        assert_eq!(o.get("missing"), None);
    }

    #[test]
    fn test_from_conversions() {
        let v: AmfValue = "test".into();
        assert!(matches!(v, AmfValue::String(_)));

        let v: AmfValue = 42.0.into();
        assert!(matches!(v, AmfValue::Number(_)));

        let v: AmfValue = true.into();
        assert!(matches!(v, AmfValue::Boolean(true)));

        let v: AmfValue = vec![1, 2, 3].into();
        assert_eq!(v.marker(), Marker::StrictArray);
        assert_eq!(v.as_strict_array().unwrap().borrow().len(), 3);
    }

    #[test]
    fn test_object_keeps_insertion_order() {
        let mut obj = AmfObject::new();
        obj.insert("zeta", AmfValue::Null);
        obj.insert("alpha", AmfValue::Null);
        obj.insert("mid", AmfValue::Null);
        obj.insert("zeta", AmfValue::Number(1.0));

        let keys: Vec<&str> = obj.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(obj.get("zeta"), Some(&AmfValue::Number(1.0)));
    }

    #[test]
    fn test_typed_object_marker() {
        let plain = AmfValue::object([("a", AmfValue::Null)]);
        assert_eq!(plain.marker(), Marker::Object);
        assert_eq!(plain.class_name(), None);

        let typed = AmfValue::typed_object("org.amf.ASClass", [("a", AmfValue::Null)]);
        assert_eq!(typed.marker(), Marker::TypedObject);
        assert_eq!(typed.class_name().as_deref(), Some("org.amf.ASClass"));
    }

    #[test]
    fn test_array_key_parse() {
        assert_eq!(ArrayKey::parse("0"), ArrayKey::Index(0));
        assert_eq!(ArrayKey::parse("42"), ArrayKey::Index(42));
        assert_eq!(ArrayKey::parse("4294967294"), ArrayKey::Index(u32::MAX - 1));
        assert_eq!(ArrayKey::parse("4294967295"), ArrayKey::Name("4294967295".into()));
        assert_eq!(ArrayKey::parse("007"), ArrayKey::Name("007".into()));
        assert_eq!(ArrayKey::parse("-1"), ArrayKey::Name("-1".into()));
        assert_eq!(ArrayKey::parse("1.5"), ArrayKey::Name("1.5".into()));
        assert_eq!(ArrayKey::parse(""), ArrayKey::Name(String::new()));
        assert_eq!(ArrayKey::parse("duration"), ArrayKey::Name("duration".into()));
        assert_eq!(ArrayKey::Index(17).as_wire_str(), "17");
    }

    #[test]
    fn test_ecma_array_length() {
        let mut arr = EcmaArray::new();
        assert_eq!(arr.len(), 0);

        arr.insert("duration", AmfValue::Number(7.211));
        assert_eq!(arr.len(), 0);
        assert_eq!(arr.entry_count(), 1);

        arr.insert("3", AmfValue::from("x"));
        arr.push(AmfValue::from("y"));
        assert_eq!(arr.len(), 5);
        assert_eq!(arr.get_index(3), Some(&AmfValue::from("x")));
        assert_eq!(arr.get("4"), Some(&AmfValue::from("y")));

        let named: Vec<&str> = arr.named().map(|(k, _)| k).collect();
        assert_eq!(named, ["duration"]);
    }

    #[test]
    fn test_ecma_array_push_past_last_index() {
        let mut arr = EcmaArray::new();
        arr.insert(u32::MAX - 1, AmfValue::Null);
        assert_eq!(arr.len(), u32::MAX as usize);

        arr.push(AmfValue::from("last"));
        assert_eq!(arr.len(), u32::MAX as usize);
        assert_eq!(arr.get("4294967295"), Some(&AmfValue::from("last")));
        let keys: Vec<&ArrayKey> = arr.iter().map(|(k, _)| k).collect();
        assert_eq!(keys[1], &ArrayKey::Name("4294967295".into()));

        let value = AmfValue::from(arr);
        let decoded = crate::amf::decode(&crate::amf::encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_identity_vs_structure() {
        let a = AmfValue::object([("x", AmfValue::Number(1.0))]);
        let b = AmfValue::object([("x", AmfValue::Number(1.0))]);
        let a2 = a.clone();

        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a2));
        assert!(!AmfValue::Null.ptr_eq(&AmfValue::Null));
    }
}
