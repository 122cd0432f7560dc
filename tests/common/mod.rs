//! An in-memory stand-in for the VM.
//!
//! Implements [`NativeInterface`] over a tiny object heap with classes,
//! methods backed by closures, fields, strings, a reference table and one
//! pending-exception slot. It also keeps a ledger of everything the bindings
//! release so tests can check ownership.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CStr;
use std::rc::Rc;

use jbridge::ffi::{JavaKind, Target, Value};
use jbridge::{ContextOptions, Env, Error, FieldId, MethodId, NativeInterface, ObjectRef, RefKind, Result};

pub const SAMPLE: &str = "com/example/Sample";

/// A throw raised by a method body.
pub struct Throw {
    pub class: &'static str,
    pub message: Option<String>,
}

impl Throw {
    pub fn new(class: &'static str, message: &str) -> Self {
        Self {
            class,
            message: Some(message.to_string()),
        }
    }

    pub fn bare(class: &'static str) -> Self {
        Self { class, message: None }
    }
}

type Body = Rc<dyn Fn(&mut Heap, Option<usize>, &[Value]) -> std::result::Result<Value, Throw>>;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Slot {
    Value(Value),
    Object(Option<usize>),
}

struct Object {
    class: String,
    fields: HashMap<usize, Slot>,
    string: Option<Vec<u16>>,
    /// Set on `java.lang.Class` instances.
    class_path: Option<String>,
    message: Option<String>,
    collected: bool,
}

struct ClassDef {
    superclass: Option<String>,
    object: usize,
}

struct Method {
    class: String,
    name: String,
    signature: String,
    is_static: bool,
    body: Body,
}

struct Field {
    class: String,
    name: String,
    signature: String,
    is_static: bool,
}

/// Heap state, handed to method bodies.
pub struct Heap {
    objects: Vec<Object>,
    classes: HashMap<String, ClassDef>,
    methods: Vec<Method>,
    fields: Vec<Field>,
    statics: HashMap<usize, Slot>,
    refs: HashMap<usize, (usize, RefKind)>,
    next_ref: usize,
    pending: Option<usize>,
    released: Vec<RefKind>,
    bad_releases: Vec<String>,
    dispatched: Vec<JavaKind>,
    described: usize,
}

fn kind_of(signature: &str) -> JavaKind {
    match signature.as_bytes().first() {
        Some(b'Z') => JavaKind::Boolean,
        Some(b'B') => JavaKind::Byte,
        Some(b'C') => JavaKind::Char,
        Some(b'S') => JavaKind::Short,
        Some(b'I') => JavaKind::Int,
        Some(b'J') => JavaKind::Long,
        Some(b'F') => JavaKind::Float,
        Some(b'D') => JavaKind::Double,
        Some(b'V') => JavaKind::Void,
        _ => JavaKind::Object,
    }
}

fn return_kind(signature: &str) -> JavaKind {
    match signature.rfind(')') {
        Some(end) => kind_of(&signature[end + 1..]),
        None => JavaKind::Void,
    }
}

fn zero(kind: JavaKind) -> Value {
    match kind {
        JavaKind::Boolean => Value::Boolean(false),
        JavaKind::Byte => Value::Byte(0),
        JavaKind::Char => Value::Char(0),
        JavaKind::Short => Value::Short(0),
        JavaKind::Int => Value::Int(0),
        JavaKind::Long => Value::Long(0),
        JavaKind::Float => Value::Float(0.0),
        JavaKind::Double => Value::Double(0.0),
        JavaKind::Object => Value::Object(ObjectRef::null()),
        JavaKind::Void => Value::Void,
    }
}

fn mismatch(what: &str) -> Error {
    Error::Unknown(format!("fake runtime: {}", what))
}

impl Heap {
    fn alloc(&mut self, class: &str) -> usize {
        self.objects.push(Object {
            class: class.to_string(),
            fields: HashMap::new(),
            string: None,
            class_path: None,
            message: None,
            collected: false,
        });
        self.objects.len() - 1
    }

    fn new_ref(&mut self, object: usize, kind: RefKind) -> ObjectRef {
        self.next_ref += 8;
        self.refs.insert(self.next_ref, (object, kind));
        ObjectRef::from_raw(self.next_ref)
    }

    /// A fresh local reference to `object`.
    pub fn local(&mut self, object: usize) -> ObjectRef {
        self.new_ref(object, RefKind::Local)
    }

    /// The object behind a reference; `None` for null, unknown or collected.
    pub fn deref(&self, obj: ObjectRef) -> Option<usize> {
        let (index, _) = self.refs.get(&obj.as_raw())?;
        if self.objects[*index].collected {
            None
        } else {
            Some(*index)
        }
    }

    /// Allocate a string and return a local reference to it.
    pub fn new_string(&mut self, text: &str) -> Value {
        let index = self.alloc("java/lang/String");
        self.objects[index].string = Some(text.encode_utf16().collect());
        Value::Object(self.local(index))
    }

    /// The text of a string argument, `None` for null.
    pub fn text(&self, value: &Value) -> Option<String> {
        match value {
            Value::Object(obj) => {
                let index = self.deref(*obj)?;
                let utf16 = self.objects[index].string.as_ref()?;
                Some(String::from_utf16_lossy(utf16))
            }
            _ => None,
        }
    }

    fn define_class(&mut self, path: &str, superclass: Option<&str>) {
        let object = self.alloc("java/lang/Class");
        self.objects[object].class_path = Some(path.to_string());
        self.classes.insert(
            path.to_string(),
            ClassDef {
                superclass: superclass.map(str::to_string),
                object,
            },
        );
    }

    fn method<F>(&mut self, class: &str, name: &str, signature: &str, is_static: bool, body: F)
    where
        F: Fn(&mut Heap, Option<usize>, &[Value]) -> std::result::Result<Value, Throw> + 'static,
    {
        self.methods.push(Method {
            class: class.to_string(),
            name: name.to_string(),
            signature: signature.to_string(),
            is_static,
            body: Rc::new(body),
        });
    }

    fn field(&mut self, class: &str, name: &str, signature: &str, is_static: bool) -> usize {
        self.fields.push(Field {
            class: class.to_string(),
            name: name.to_string(),
            signature: signature.to_string(),
            is_static,
        });
        self.fields.len()
    }

    fn field_named(&self, class: &str, name: &str) -> usize {
        self.fields
            .iter()
            .position(|f| f.class == class && f.name == name)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Read an instance field of `object` by name.
    pub fn get(&self, object: usize, class: &str, name: &str) -> Value {
        let id = self.field_named(class, name);
        match self.objects[object].fields.get(&id) {
            Some(Slot::Value(value)) => *value,
            _ => zero(kind_of(&self.fields[id - 1].signature)),
        }
    }

    /// Write a primitive instance field of `object` by name.
    pub fn put(&mut self, object: usize, class: &str, name: &str, value: Value) {
        let id = self.field_named(class, name);
        self.objects[object].fields.insert(id, Slot::Value(value));
    }

    fn class_chain(&self, path: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(path.to_string());
        while let Some(path) = current {
            current = self.classes.get(&path).and_then(|c| c.superclass.clone());
            chain.push(path);
        }
        chain
    }

    fn class_path_of(&self, class: ObjectRef) -> Option<String> {
        let index = self.deref(class)?;
        self.objects[index].class_path.clone()
    }

    fn throw(&mut self, throw: Throw) {
        let index = self.alloc(throw.class);
        self.objects[index].message = throw.message;
        self.pending = Some(index);
    }

    fn to_slot(&self, value: Value) -> Slot {
        match value {
            Value::Object(obj) => Slot::Object(self.deref(obj)),
            other => Slot::Value(other),
        }
    }

    fn from_slot(&mut self, slot: Slot) -> Value {
        match slot {
            Slot::Value(value) => value,
            Slot::Object(Some(index)) => Value::Object(self.local(index)),
            Slot::Object(None) => Value::Object(ObjectRef::null()),
        }
    }
}

fn int(args: &[Value], i: usize) -> i32 {
    match args[i] {
        Value::Int(v) => v,
        other => panic!("expected int argument, got {:?}", other),
    }
}

fn install_builtins(heap: &mut Heap) {
    heap.define_class("java/lang/Object", None);
    heap.define_class("java/lang/Class", Some("java/lang/Object"));
    heap.define_class("java/lang/String", Some("java/lang/Object"));
    heap.define_class("java/lang/Number", Some("java/lang/Object"));
    heap.define_class("java/lang/Integer", Some("java/lang/Number"));
    heap.define_class("java/lang/Throwable", Some("java/lang/Object"));
    heap.define_class("java/lang/Error", Some("java/lang/Throwable"));
    heap.define_class("java/lang/NoSuchMethodError", Some("java/lang/Error"));
    heap.define_class("java/lang/NoSuchFieldError", Some("java/lang/Error"));
    heap.define_class("java/lang/NoClassDefFoundError", Some("java/lang/Error"));
    heap.define_class("java/lang/Exception", Some("java/lang/Throwable"));
    heap.define_class("java/lang/RuntimeException", Some("java/lang/Exception"));
    heap.define_class("java/lang/ArithmeticException", Some("java/lang/RuntimeException"));
    heap.define_class("java/lang/IllegalStateException", Some("java/lang/RuntimeException"));
    heap.define_class("java/lang/NumberFormatException", Some("java/lang/RuntimeException"));

    heap.method("java/lang/Object", "<init>", "()V", false, |_, _, _| Ok(Value::Void));

    heap.method("java/lang/Class", "getName", "()Ljava/lang/String;", false, |heap, this, _| {
        let this = this.expect("getName needs an instance");
        let path = heap.objects[this].class_path.clone().unwrap_or_default();
        Ok(heap.new_string(&path.replace('/', ".")))
    });

    heap.method("java/lang/String", "length", "()I", false, |heap, this, _| {
        let this = this.expect("length needs an instance");
        let len = heap.objects[this].string.as_ref().map_or(0, Vec::len);
        Ok(Value::Int(len as i32))
    });

    heap.method("java/lang/Throwable", "getMessage", "()Ljava/lang/String;", false, |heap, this, _| {
        let this = this.expect("getMessage needs an instance");
        Ok(match heap.objects[this].message.clone() {
            Some(message) => heap.new_string(&message),
            None => Value::Object(ObjectRef::null()),
        })
    });

    // java.lang.Integer
    heap.field("java/lang/Integer", "value", "I", false);
    let max = heap.field("java/lang/Integer", "MAX_VALUE", "I", true);
    heap.statics.insert(max, Slot::Value(Value::Int(i32::MAX)));
    heap.method("java/lang/Integer", "<init>", "(I)V", false, |heap, this, args| {
        let this = this.expect("constructor needs an instance");
        heap.put(this, "java/lang/Integer", "value", Value::Int(int(args, 0)));
        Ok(Value::Void)
    });
    heap.method("java/lang/Integer", "intValue", "()I", false, |heap, this, _| {
        let this = this.expect("intValue needs an instance");
        Ok(heap.get(this, "java/lang/Integer", "value"))
    });
    heap.method("java/lang/Integer", "toString", "()Ljava/lang/String;", false, |heap, this, _| {
        let this = this.expect("toString needs an instance");
        match heap.get(this, "java/lang/Integer", "value") {
            Value::Int(v) => Ok(heap.new_string(&v.to_string())),
            _ => Err(Throw::bare("java/lang/IllegalStateException")),
        }
    });
    heap.method(
        "java/lang/Integer",
        "valueOf",
        "(I)Ljava/lang/Integer;",
        true,
        |heap, _, args| {
            let index = heap.alloc("java/lang/Integer");
            heap.put(index, "java/lang/Integer", "value", Value::Int(int(args, 0)));
            Ok(Value::Object(heap.local(index)))
        },
    );
    heap.method("java/lang/Integer", "parseInt", "(Ljava/lang/String;)I", true, |heap, _, args| {
        let text = heap.text(&args[0]).unwrap_or_default();
        text.parse::<i32>().map(Value::Int).map_err(|_| {
            Throw::new(
                "java/lang/NumberFormatException",
                &format!("For input string: \"{}\"", text),
            )
        })
    });

    install_sample(heap);
}

/// `com.example.Sample`: one field of every category plus methods that
/// exercise each call variant.
fn install_sample(heap: &mut Heap) {
    heap.define_class(SAMPLE, Some("java/lang/Object"));
    for (name, signature) in [
        ("flag", "Z"),
        ("small", "B"),
        ("letter", "C"),
        ("short", "S"),
        ("count", "I"),
        ("big", "J"),
        ("ratio", "F"),
        ("precise", "D"),
        ("label", "Ljava/lang/String;"),
        ("other", "Ljava/lang/Object;"),
    ] {
        heap.field(SAMPLE, name, signature, false);
    }
    heap.field(SAMPLE, "instances", "I", true);
    heap.field(SAMPLE, "greeting", "Ljava/lang/String;", true);

    heap.method(SAMPLE, "<init>", "()V", false, |heap, _, _| {
        bump_instances(heap);
        Ok(Value::Void)
    });
    heap.method(SAMPLE, "<init>", "(ILjava/lang/String;)V", false, |heap, this, args| {
        let this = this.expect("constructor needs an instance");
        heap.put(this, SAMPLE, "count", Value::Int(int(args, 0)));
        let label = heap.field_named(SAMPLE, "label");
        let slot = heap.to_slot(args[1]);
        heap.objects[this].fields.insert(label, slot);
        bump_instances(heap);
        Ok(Value::Void)
    });
    heap.method(SAMPLE, "<init>", "(Z)V", false, |_, _, args| {
        if args[0] == Value::Boolean(true) {
            Err(Throw::new("java/lang/IllegalStateException", "refused"))
        } else {
            Ok(Value::Void)
        }
    });

    heap.method(SAMPLE, "not", "(Z)Z", false, |_, _, args| match args[0] {
        Value::Boolean(v) => Ok(Value::Boolean(!v)),
        _ => Err(Throw::bare("java/lang/IllegalStateException")),
    });
    heap.method(SAMPLE, "next", "(B)B", false, |_, _, args| match args[0] {
        Value::Byte(v) => Ok(Value::Byte(v.wrapping_add(1))),
        _ => Err(Throw::bare("java/lang/IllegalStateException")),
    });
    heap.method(SAMPLE, "upper", "(C)C", false, |_, _, args| match args[0] {
        Value::Char(v) => Ok(Value::Char(if (b'a' as u16..=b'z' as u16).contains(&v) { v - 32 } else { v })),
        _ => Err(Throw::bare("java/lang/IllegalStateException")),
    });
    heap.method(SAMPLE, "twice", "(S)S", false, |_, _, args| match args[0] {
        Value::Short(v) => Ok(Value::Short(v.wrapping_mul(2))),
        _ => Err(Throw::bare("java/lang/IllegalStateException")),
    });
    heap.method(SAMPLE, "add", "(II)I", false, |_, _, args| {
        Ok(Value::Int(int(args, 0).wrapping_add(int(args, 1))))
    });
    heap.method(SAMPLE, "mul", "(JJ)J", false, |_, _, args| match (args[0], args[1]) {
        (Value::Long(a), Value::Long(b)) => Ok(Value::Long(a.wrapping_mul(b))),
        _ => Err(Throw::bare("java/lang/IllegalStateException")),
    });
    heap.method(SAMPLE, "half", "(F)F", false, |_, _, args| match args[0] {
        Value::Float(v) => Ok(Value::Float(v / 2.0)),
        _ => Err(Throw::bare("java/lang/IllegalStateException")),
    });
    heap.method(SAMPLE, "scale", "(DI)D", false, |_, _, args| match args[0] {
        Value::Double(v) => Ok(Value::Double(v * f64::from(int(args, 1)))),
        _ => Err(Throw::bare("java/lang/IllegalStateException")),
    });
    heap.method(SAMPLE, "sum", "(ZBCSIJFD)D", false, |_, _, args| {
        let mut total = 0.0;
        for arg in args {
            total += match *arg {
                Value::Boolean(v) => f64::from(u8::from(v)),
                Value::Byte(v) => f64::from(v),
                Value::Char(v) => f64::from(v),
                Value::Short(v) => f64::from(v),
                Value::Int(v) => f64::from(v),
                Value::Long(v) => v as f64,
                Value::Float(v) => f64::from(v),
                Value::Double(v) => v,
                _ => return Err(Throw::bare("java/lang/IllegalStateException")),
            };
        }
        Ok(Value::Double(total))
    });
    heap.method(SAMPLE, "greet", "(Ljava/lang/String;)Ljava/lang/String;", false, |heap, _, args| {
        let name = heap.text(&args[0]).unwrap_or_else(|| "nobody".to_string());
        Ok(heap.new_string(&format!("Hello, {}!", name)))
    });
    heap.method(SAMPLE, "nothing", "()Ljava/lang/String;", false, |_, _, _| {
        Ok(Value::Object(ObjectRef::null()))
    });
    heap.method(SAMPLE, "touch", "()V", false, |heap, this, _| {
        let this = this.expect("touch needs an instance");
        let count = match heap.get(this, SAMPLE, "count") {
            Value::Int(v) => v,
            _ => 0,
        };
        heap.put(this, SAMPLE, "count", Value::Int(count + 1));
        Ok(Value::Void)
    });
    heap.method(SAMPLE, "divide", "(II)I", false, |_, _, args| {
        let (a, b) = (int(args, 0), int(args, 1));
        if b == 0 {
            Err(Throw::new("java/lang/ArithmeticException", "/ by zero"))
        } else {
            Ok(Value::Int(a / b))
        }
    });
    heap.method(SAMPLE, "fail", "()V", false, |_, _, _| {
        Err(Throw::bare("java/lang/IllegalStateException"))
    });
    heap.method(SAMPLE, "failWithObject", "()Ljava/lang/Object;", false, |heap, _, _| {
        heap.throw(Throw::new("java/lang/IllegalStateException", "half done"));
        let index = heap.alloc("java/lang/Object");
        Ok(Value::Object(heap.local(index)))
    });
    heap.method(SAMPLE, "self", "()Lcom/example/Sample;", false, |heap, this, _| {
        let this = this.expect("self needs an instance");
        Ok(Value::Object(heap.local(this)))
    });

    heap.method(SAMPLE, "instances", "()I", true, |heap, _, _| {
        let id = heap.field_named(SAMPLE, "instances");
        let value = heap.statics.get(&id).copied();
        Ok(match value {
            Some(Slot::Value(value)) => value,
            _ => Value::Int(0),
        })
    });
    heap.method(
        SAMPLE,
        "join",
        "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
        true,
        |heap, _, args| {
            let a = heap.text(&args[0]).unwrap_or_default();
            let b = heap.text(&args[1]).unwrap_or_default();
            Ok(heap.new_string(&format!("{}{}", a, b)))
        },
    );
    heap.method(SAMPLE, "boom", "()I", true, |_, _, _| {
        Err(Throw::new("java/lang/ArithmeticException", "static boom"))
    });
}

fn bump_instances(heap: &mut Heap) {
    let id = heap.field_named(SAMPLE, "instances");
    let current = match heap.statics.get(&id) {
        Some(Slot::Value(Value::Int(v))) => *v,
        _ => 0,
    };
    heap.statics.insert(id, Slot::Value(Value::Int(current + 1)));
}

/// The in-memory runtime.
pub struct FakeRuntime {
    heap: RefCell<Heap>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        let mut heap = Heap {
            objects: Vec::new(),
            classes: HashMap::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            statics: HashMap::new(),
            refs: HashMap::new(),
            next_ref: 0x1000,
            pending: None,
            released: Vec::new(),
            bad_releases: Vec::new(),
            dispatched: Vec::new(),
            described: 0,
        };
        install_builtins(&mut heap);
        Self {
            heap: RefCell::new(heap),
        }
    }

    pub fn env(&self) -> Env<'_> {
        Env::new(self)
    }

    pub fn env_with(&self, options: ContextOptions) -> Env<'_> {
        Env::with_options(self, options)
    }

    /// Number of live references of any kind.
    pub fn live_refs(&self) -> usize {
        self.heap.borrow().refs.len()
    }

    /// Number of live references of `kind`.
    pub fn live_refs_of(&self, kind: RefKind) -> usize {
        self.heap
            .borrow()
            .refs
            .values()
            .filter(|(_, k)| *k == kind)
            .count()
    }

    /// Kinds of every reference released so far, in order.
    pub fn released(&self) -> Vec<RefKind> {
        self.heap.borrow().released.clone()
    }

    /// Deletes of unknown references or with the wrong release call.
    pub fn bad_releases(&self) -> Vec<String> {
        self.heap.borrow().bad_releases.clone()
    }

    /// Return categories of every method call so far, in order.
    pub fn dispatched(&self) -> Vec<JavaKind> {
        self.heap.borrow().dispatched.clone()
    }

    pub fn exception_pending(&self) -> bool {
        self.heap.borrow().pending.is_some()
    }

    /// How often a pending exception was printed.
    pub fn described(&self) -> usize {
        self.heap.borrow().described
    }

    /// Pretend the collector reclaimed the object behind `obj`.
    pub fn collect(&self, obj: ObjectRef) {
        let mut heap = self.heap.borrow_mut();
        if let Some((index, _)) = heap.refs.get(&obj.as_raw()).copied() {
            heap.objects[index].collected = true;
        }
    }

    /// Hand out a raw local reference to a new plain object.
    pub fn raw_object(&self) -> ObjectRef {
        let mut heap = self.heap.borrow_mut();
        let index = heap.alloc("java/lang/Object");
        heap.local(index)
    }

    fn delete(&self, obj: ObjectRef, kind: RefKind) -> Result<()> {
        let mut heap = self.heap.borrow_mut();
        match heap.refs.get(&obj.as_raw()).copied() {
            Some((_, actual)) if actual == kind => {
                heap.refs.remove(&obj.as_raw());
                heap.released.push(kind);
            }
            Some((_, actual)) => {
                let message = format!("{:?} reference deleted as {:?}", actual, kind);
                heap.bad_releases.push(message);
            }
            None => {
                let message = format!("unknown reference {:#x} deleted as {:?}", obj.as_raw(), kind);
                heap.bad_releases.push(message);
            }
        }
        Ok(())
    }

    fn promote(&self, obj: ObjectRef, kind: RefKind) -> Result<ObjectRef> {
        let mut heap = self.heap.borrow_mut();
        match heap.deref(obj) {
            Some(index) => Ok(heap.new_ref(index, kind)),
            None => Ok(ObjectRef::null()),
        }
    }

    fn run(&self, method: usize, this: Option<usize>, args: &[Value]) -> Option<Value> {
        let body = self.heap.borrow().methods[method].body.clone();
        let mut heap = self.heap.borrow_mut();
        match body(&mut *heap, this, args) {
            Ok(value) => Some(value),
            Err(throw) => {
                heap.throw(throw);
                None
            }
        }
    }
}

impl NativeInterface for FakeRuntime {
    fn find_class(&self, path: &CStr) -> Result<ObjectRef> {
        let path = path.to_string_lossy().into_owned();
        let mut heap = self.heap.borrow_mut();
        match heap.classes.get(&path).map(|c| c.object) {
            Some(object) => Ok(heap.local(object)),
            None => {
                heap.throw(Throw::new("java/lang/NoClassDefFoundError", &path));
                Ok(ObjectRef::null())
            }
        }
    }

    fn get_object_class(&self, obj: ObjectRef) -> Result<ObjectRef> {
        let mut heap = self.heap.borrow_mut();
        let index = heap.deref(obj).ok_or_else(|| mismatch("class of null"))?;
        let class = heap.objects[index].class.clone();
        let object = heap
            .classes
            .get(&class)
            .map(|c| c.object)
            .ok_or_else(|| mismatch("object of undefined class"))?;
        Ok(heap.local(object))
    }

    fn get_method_id(
        &self,
        class: ObjectRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Result<MethodId> {
        let name = name.to_string_lossy();
        let signature = signature.to_string_lossy();
        let mut heap = self.heap.borrow_mut();
        let path = heap.class_path_of(class).ok_or_else(|| mismatch("not a class"))?;
        let chain = if name == "<init>" {
            vec![path]
        } else {
            heap.class_chain(&path)
        };
        let found = chain.iter().find_map(|owner| {
            heap.methods.iter().position(|m| {
                &m.class == owner && m.name == name && m.signature == signature && m.is_static == is_static
            })
        });
        match found {
            Some(index) => Ok(MethodId::from_raw(index + 1)),
            None => {
                heap.throw(Throw::new("java/lang/NoSuchMethodError", &name));
                Ok(MethodId::null())
            }
        }
    }

    fn get_field_id(
        &self,
        class: ObjectRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Result<FieldId> {
        let name = name.to_string_lossy();
        let signature = signature.to_string_lossy();
        let mut heap = self.heap.borrow_mut();
        let path = heap.class_path_of(class).ok_or_else(|| mismatch("not a class"))?;
        let chain = heap.class_chain(&path);
        let found = chain.iter().find_map(|owner| {
            heap.fields.iter().position(|f| {
                &f.class == owner && f.name == name && f.signature == signature && f.is_static == is_static
            })
        });
        match found {
            Some(index) => Ok(FieldId::from_raw(index + 1)),
            None => {
                heap.throw(Throw::new("java/lang/NoSuchFieldError", &name));
                Ok(FieldId::null())
            }
        }
    }

    fn new_object(&self, class: ObjectRef, ctor: MethodId, args: &[Value]) -> Result<ObjectRef> {
        let index = {
            let mut heap = self.heap.borrow_mut();
            let path = heap.class_path_of(class).ok_or_else(|| mismatch("not a class"))?;
            let method = heap
                .methods
                .get(ctor.as_raw().wrapping_sub(1))
                .ok_or_else(|| mismatch("unknown constructor"))?;
            if method.name != "<init>" || method.class != path {
                return Err(mismatch("constructor of another class"));
            }
            heap.alloc(&path)
        };
        match self.run(ctor.as_raw() - 1, Some(index), args) {
            Some(_) => Ok(self.heap.borrow_mut().local(index)),
            None => Ok(ObjectRef::null()),
        }
    }

    fn call_method(
        &self,
        target: Target,
        method: MethodId,
        ret: JavaKind,
        args: &[Value],
    ) -> Result<Value> {
        let slot = method.as_raw().wrapping_sub(1);
        let this = {
            let mut heap = self.heap.borrow_mut();
            heap.dispatched.push(ret);
            let m = heap.methods.get(slot).ok_or_else(|| mismatch("unknown method"))?;
            if return_kind(&m.signature) != ret {
                return Err(mismatch("call variant does not match the return type"));
            }
            match target {
                Target::Instance(obj) => {
                    if m.is_static {
                        return Err(mismatch("static method called on an instance"));
                    }
                    Some(heap.deref(obj).ok_or_else(|| mismatch("call on null"))?)
                }
                Target::Static(_) => {
                    if !m.is_static {
                        return Err(mismatch("instance method called statically"));
                    }
                    None
                }
            }
        };
        Ok(self.run(slot, this, args).unwrap_or_else(|| zero(ret)))
    }

    fn get_field(&self, target: Target, field: FieldId, kind: JavaKind) -> Result<Value> {
        let mut heap = self.heap.borrow_mut();
        let id = field.as_raw();
        let f = heap.fields.get(id.wrapping_sub(1)).ok_or_else(|| mismatch("unknown field"))?;
        let declared = kind_of(&f.signature);
        if declared != kind {
            return Err(mismatch("field read with the wrong accessor"));
        }
        let slot = match target {
            Target::Instance(obj) => {
                let index = heap.deref(obj).ok_or_else(|| mismatch("field of null"))?;
                heap.objects[index].fields.get(&id).copied()
            }
            Target::Static(_) => heap.statics.get(&id).copied(),
        };
        Ok(match slot {
            Some(slot) => heap.from_slot(slot),
            None => zero(declared),
        })
    }

    fn set_field(&self, target: Target, field: FieldId, value: Value) -> Result<()> {
        let mut heap = self.heap.borrow_mut();
        let id = field.as_raw();
        let f = heap.fields.get(id.wrapping_sub(1)).ok_or_else(|| mismatch("unknown field"))?;
        if kind_of(&f.signature) != value.kind() {
            return Err(mismatch("field written with the wrong accessor"));
        }
        let slot = heap.to_slot(value);
        match target {
            Target::Instance(obj) => {
                let index = heap.deref(obj).ok_or_else(|| mismatch("field of null"))?;
                heap.objects[index].fields.insert(id, slot);
            }
            Target::Static(_) => {
                heap.statics.insert(id, slot);
            }
        }
        Ok(())
    }

    fn new_string(&self, utf16: &[u16]) -> Result<ObjectRef> {
        let mut heap = self.heap.borrow_mut();
        let index = heap.alloc("java/lang/String");
        heap.objects[index].string = Some(utf16.to_vec());
        Ok(heap.local(index))
    }

    fn get_string_chars(&self, string: ObjectRef) -> Result<Vec<u16>> {
        let heap = self.heap.borrow();
        let index = heap.deref(string).ok_or_else(|| mismatch("chars of null"))?;
        heap.objects[index]
            .string
            .clone()
            .ok_or_else(|| mismatch("chars of a non-string"))
    }

    fn get_object_ref_type(&self, obj: ObjectRef) -> Result<RefKind> {
        Ok(self
            .heap
            .borrow()
            .refs
            .get(&obj.as_raw())
            .map_or(RefKind::Invalid, |(_, kind)| *kind))
    }

    fn new_local_ref(&self, obj: ObjectRef) -> Result<ObjectRef> {
        self.promote(obj, RefKind::Local)
    }

    fn new_global_ref(&self, obj: ObjectRef) -> Result<ObjectRef> {
        self.promote(obj, RefKind::Global)
    }

    fn new_weak_global_ref(&self, obj: ObjectRef) -> Result<ObjectRef> {
        self.promote(obj, RefKind::WeakGlobal)
    }

    fn delete_local_ref(&self, obj: ObjectRef) -> Result<()> {
        self.delete(obj, RefKind::Local)
    }

    fn delete_global_ref(&self, obj: ObjectRef) -> Result<()> {
        self.delete(obj, RefKind::Global)
    }

    fn delete_weak_global_ref(&self, obj: ObjectRef) -> Result<()> {
        self.delete(obj, RefKind::WeakGlobal)
    }

    fn is_same_object(&self, a: ObjectRef, b: ObjectRef) -> Result<bool> {
        let heap = self.heap.borrow();
        Ok(heap.deref(a) == heap.deref(b))
    }

    fn is_instance_of(&self, obj: ObjectRef, class: ObjectRef) -> Result<bool> {
        let heap = self.heap.borrow();
        let Some(index) = heap.deref(obj) else {
            return Ok(true);
        };
        let path = heap.class_path_of(class).ok_or_else(|| mismatch("not a class"))?;
        Ok(heap.class_chain(&heap.objects[index].class).contains(&path))
    }

    fn exception_check(&self) -> Result<bool> {
        Ok(self.heap.borrow().pending.is_some())
    }

    fn exception_occurred(&self) -> Result<ObjectRef> {
        let mut heap = self.heap.borrow_mut();
        Ok(match heap.pending {
            Some(index) => heap.local(index),
            None => ObjectRef::null(),
        })
    }

    fn exception_clear(&self) -> Result<()> {
        self.heap.borrow_mut().pending = None;
        Ok(())
    }

    /// Prints and clears, like the VM does.
    fn exception_describe(&self) -> Result<()> {
        let mut heap = self.heap.borrow_mut();
        if heap.pending.take().is_some() {
            heap.described += 1;
        }
        Ok(())
    }
}
