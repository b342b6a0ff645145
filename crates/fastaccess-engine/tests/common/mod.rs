//! In-memory type model shared by the integration tests.
//!
//! Classes:
//! - `demo.IntList`: constructors `[(), (int)]`, methods `[size():int, get(int):object]`
//! - `demo.Counter`: no default constructor, static and instance fields of several kinds
//! - `demo.Shape` / `demo.Square`: virtual, final, private and abstract methods with overrides
//! - `demo.Named`: interface implemented by `demo.Square`
//! - `demo.Empty`: no members at all
//! - `demo.Broken`: static method without a handle, fails at link time
//! - `demo.Loose`: members whose bodies return a different primitive than declared
//! - `plugin.Widget`: hosted in a non-system scope

#![allow(dead_code)]

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fastaccess_engine::{
    downcast_object, AccessorCompiler, ClassId, ConstructorDescriptor, ConstructorFn,
    FieldDescriptor, FieldHandle, MemberError, MethodDescriptor, MethodFn, Modifiers, Object,
    ObjectRef, ScopeId, ScopeRegistry, ScopeResolver, TypeDescription, TypeModel, Value,
    ValueType,
};
use parking_lot::Mutex;

pub const INT_LIST: ClassId = ClassId(100);
pub const COUNTER: ClassId = ClassId(101);
pub const SHAPE: ClassId = ClassId(110);
pub const SQUARE: ClassId = ClassId(111);
pub const NAMED: ClassId = ClassId(120);
pub const EMPTY: ClassId = ClassId(130);
pub const BROKEN: ClassId = ClassId(140);
pub const LOOSE: ClassId = ClassId(150);
pub const WIDGET: ClassId = ClassId(200);

pub const PLUGIN_SCOPE: ScopeId = ScopeId(9);

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

/// Instance of any fixture class: named slots plus a list payload
#[derive(Debug)]
pub struct Instance {
    class: ClassId,
    slots: Mutex<HashMap<&'static str, Value>>,
    items: Mutex<Vec<Value>>,
}

impl Instance {
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            slots: Mutex::new(HashMap::new()),
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn with_slot(self, name: &'static str, value: Value) -> Self {
        self.slots.lock().insert(name, value);
        self
    }

    pub fn with_items(self, items: Vec<Value>) -> Self {
        *self.items.lock() = items;
        self
    }

    pub fn slot(&self, name: &str) -> Value {
        self.slots.lock().get(name).cloned().unwrap_or_default()
    }

    pub fn set_slot(&self, name: &'static str, value: Value) {
        self.slots.lock().insert(name, value);
    }

    pub fn items(&self) -> Vec<Value> {
        self.items.lock().clone()
    }

    pub fn into_ref(self) -> ObjectRef {
        Arc::new(self)
    }
}

impl Object for Instance {
    fn class_id(&self) -> ClassId {
        self.class
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Fixture instance behind an object reference
pub fn instance(object: &ObjectRef) -> &Instance {
    downcast_object::<Instance>(object).expect("fixture instance")
}

/// Receiver of a member call
fn this(target: &Value) -> Result<&Instance, MemberError> {
    target
        .as_object()
        .and_then(downcast_object::<Instance>)
        .ok_or_else(|| "receiver is not a fixture instance".into())
}

fn ctor<F>(f: F) -> Option<ConstructorFn>
where
    F: Fn(&[Value]) -> Result<ObjectRef, MemberError> + Send + Sync + 'static,
{
    Some(Arc::new(f))
}

fn method<F>(f: F) -> Option<MethodFn>
where
    F: Fn(&Value, &[Value]) -> Result<Value, MemberError> + Send + Sync + 'static,
{
    Some(Arc::new(f))
}

/// Field stored in the receiver's slot of the same name
fn slot_field(name: &'static str) -> Option<FieldHandle> {
    Some(FieldHandle::new(
        move |target: &Value| Ok(this(target)?.slot(name)),
        move |target: &Value, value: Value| {
            this(target)?.set_slot(name, value);
            Ok(())
        },
    ))
}

/// Field stored in the model's static table
fn static_field(statics: &Arc<Mutex<HashMap<&'static str, Value>>>, name: &'static str) -> Option<FieldHandle> {
    let read = Arc::clone(statics);
    let write = Arc::clone(statics);
    Some(FieldHandle::new(
        move |_: &Value| Ok(read.lock().get(name).cloned().unwrap_or_default()),
        move |_: &Value, value: Value| {
            write.lock().insert(name, value);
            Ok(())
        },
    ))
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

struct ClassDef {
    desc: TypeDescription,
    scope: ScopeId,
    superclass: Option<ClassId>,
    interfaces: Vec<ClassId>,
    constructors: Vec<Option<ConstructorFn>>,
    methods: Vec<Option<MethodFn>>,
    fields: Vec<Option<FieldHandle>>,
}

impl ClassDef {
    fn new(class: ClassId, name: &str) -> Self {
        Self {
            desc: TypeDescription::new(class, name),
            scope: ScopeId::SYSTEM,
            superclass: None,
            interfaces: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    fn constructor(mut self, parameters: Vec<ValueType>, handle: Option<ConstructorFn>) -> Self {
        self.desc.constructors.push(ConstructorDescriptor::new(parameters));
        self.constructors.push(handle);
        self
    }

    fn method(mut self, desc: MethodDescriptor, handle: Option<MethodFn>) -> Self {
        self.desc.methods.push(desc);
        self.methods.push(handle);
        self
    }

    fn field(mut self, desc: FieldDescriptor, handle: Option<FieldHandle>) -> Self {
        self.desc.fields.push(desc);
        self.fields.push(handle);
        self
    }
}

/// Type model over the fixture classes
pub struct FixtureModel {
    classes: HashMap<ClassId, ClassDef>,
    statics: Arc<Mutex<HashMap<&'static str, Value>>>,
    handle_requests: AtomicUsize,
}

impl FixtureModel {
    pub fn new() -> Self {
        let statics = Arc::new(Mutex::new(HashMap::new()));
        statics.lock().insert("instances", Value::Int(0));

        let mut model = Self {
            classes: HashMap::new(),
            statics: Arc::clone(&statics),
            handle_requests: AtomicUsize::new(0),
        };
        for def in [
            int_list(),
            counter(&statics),
            shape(),
            square(),
            named(),
            ClassDef::new(EMPTY, "demo.Empty"),
            broken(),
            loose(),
            widget(),
        ] {
            model.classes.insert(def.desc.class, def);
        }
        model
    }

    /// Number of handle lookups served so far
    pub fn handle_requests(&self) -> usize {
        self.handle_requests.load(Ordering::SeqCst)
    }

    /// Current value of a static field
    pub fn static_value(&self, name: &str) -> Value {
        self.statics.lock().get(name).cloned().unwrap_or_default()
    }

    fn def(&self, class: ClassId) -> Option<&ClassDef> {
        self.classes.get(&class)
    }

    fn requested(&self) {
        self.handle_requests.fetch_add(1, Ordering::SeqCst);
    }
}

impl TypeModel for FixtureModel {
    fn type_name(&self, class: ClassId) -> Option<String> {
        self.def(class).map(|d| d.desc.name.clone())
    }

    fn list_constructors(&self, class: ClassId) -> Vec<ConstructorDescriptor> {
        self.def(class).map(|d| d.desc.constructors.clone()).unwrap_or_default()
    }

    fn list_methods(&self, class: ClassId) -> Vec<MethodDescriptor> {
        self.def(class).map(|d| d.desc.methods.clone()).unwrap_or_default()
    }

    fn list_fields(&self, class: ClassId) -> Vec<FieldDescriptor> {
        self.def(class).map(|d| d.desc.fields.clone()).unwrap_or_default()
    }

    fn constructor_handle(&self, class: ClassId, ordinal: usize) -> Option<ConstructorFn> {
        self.requested();
        self.def(class)?.constructors.get(ordinal)?.clone()
    }

    fn method_handle(&self, class: ClassId, ordinal: usize) -> Option<MethodFn> {
        self.requested();
        self.def(class)?.methods.get(ordinal)?.clone()
    }

    fn field_handle(&self, class: ClassId, ordinal: usize) -> Option<FieldHandle> {
        self.requested();
        self.def(class)?.fields.get(ordinal)?.clone()
    }

    fn resolve_override(&self, runtime_class: ClassId, method: &MethodDescriptor) -> Option<MethodFn> {
        let mut current = Some(runtime_class);
        while let Some(class) = current {
            let def = self.def(class)?;
            let found = def.desc.methods.iter().zip(&def.methods).find(|(m, handle)| {
                handle.is_some()
                    && m.overrides_signature(method)
                    && !m.modifiers.is_static
                    && !m.modifiers.is_private()
            });
            if let Some((_, handle)) = found {
                return handle.clone();
            }
            current = def.superclass;
        }
        None
    }

    fn is_assignable(&self, from: ClassId, to: ClassId) -> bool {
        if to == ClassId::OBJECT || from == to {
            return true;
        }
        let mut queue = VecDeque::from([from]);
        while let Some(class) = queue.pop_front() {
            if class == to {
                return true;
            }
            if let Some(def) = self.def(class) {
                queue.extend(def.superclass);
                queue.extend(def.interfaces.iter().copied());
            }
        }
        false
    }
}

impl ScopeResolver for FixtureModel {
    fn scope_of(&self, class: ClassId) -> ScopeId {
        self.def(class).map_or(ScopeId::SYSTEM, |d| d.scope)
    }
}

/// Fresh model, shared as both the type model and the scope resolver
pub fn fixture() -> Arc<FixtureModel> {
    Arc::new(FixtureModel::new())
}

/// Compiler over `model` with its own registry
pub fn compiler(model: &Arc<FixtureModel>) -> AccessorCompiler {
    AccessorCompiler::new(model.clone(), model.clone())
        .with_registry(Arc::new(ScopeRegistry::new(ScopeId::SYSTEM)))
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

fn int_list() -> ClassDef {
    ClassDef::new(INT_LIST, "demo.IntList")
        .constructor(vec![], ctor(|_| Ok(Instance::new(INT_LIST).into_ref())))
        .constructor(
            vec![ValueType::Int],
            ctor(|args| Ok(Instance::new(INT_LIST).with_items(vec![args[0].clone()]).into_ref())),
        )
        .method(
            MethodDescriptor::new("size", vec![], ValueType::Int, INT_LIST),
            method(|target, _| Ok(Value::Int(this(target)?.items().len() as i32))),
        )
        .method(
            MethodDescriptor::new("get", vec![ValueType::Int], ValueType::OBJECT, INT_LIST),
            method(|target, args| {
                let items = this(target)?.items();
                let index = args[0].int_value()?;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .ok_or_else(|| format!("index {} out of bounds for length {}", index, items.len()).into())
            }),
        )
}

fn counter(statics: &Arc<Mutex<HashMap<&'static str, Value>>>) -> ClassDef {
    let created = Arc::clone(statics);
    let counted = Arc::clone(statics);
    let counter_type = ValueType::Reference(COUNTER);

    ClassDef::new(COUNTER, "demo.Counter")
        .constructor(
            vec![ValueType::Long],
            ctor(move |args| {
                let mut statics = created.lock();
                let count = statics.get("instances").map_or(Ok(0), Value::int_value)?;
                statics.insert("instances", Value::Int(count + 1));
                Ok(Instance::new(COUNTER)
                    .with_slot("value", args[0].clone())
                    .with_slot("label", Value::string("counter"))
                    .with_slot("ratio", Value::Double(0.0))
                    .into_ref())
            }),
        )
        .method(
            MethodDescriptor::new("increment", vec![], ValueType::Void, COUNTER),
            method(|target, _| {
                let obj = this(target)?;
                obj.set_slot("value", Value::Long(obj.slot("value").long_value()? + 1));
                Ok(Value::Null)
            }),
        )
        .method(
            MethodDescriptor::new("add", vec![ValueType::Long], ValueType::Long, COUNTER),
            method(|target, args| {
                let obj = this(target)?;
                let value = obj.slot("value").long_value()? + args[0].long_value()?;
                obj.set_slot("value", Value::Long(value));
                Ok(Value::Long(value))
            }),
        )
        .method(
            MethodDescriptor::new("rename", vec![ValueType::STRING], ValueType::Void, COUNTER),
            method(|target, args| {
                this(target)?.set_slot("label", args[0].clone());
                Ok(Value::Null)
            }),
        )
        .method(
            MethodDescriptor::new("instances", vec![], ValueType::Int, COUNTER)
                .with_modifiers(Modifiers::public().with_static()),
            method(move |_, _| Ok(counted.lock().get("instances").cloned().unwrap_or_default())),
        )
        .method(
            MethodDescriptor::new("absorb", vec![counter_type], ValueType::Long, COUNTER),
            method(|target, args| {
                let obj = this(target)?;
                let other = this(&args[0])?;
                let value = obj.slot("value").long_value()? + other.slot("value").long_value()?;
                obj.set_slot("value", Value::Long(value));
                Ok(Value::Long(value))
            }),
        )
        .method(
            MethodDescriptor::new("fail", vec![], ValueType::Void, COUNTER),
            method(|_, _| Err("counter failure".into())),
        )
        .field(
            FieldDescriptor::new("instances", ValueType::Int, COUNTER)
                .with_modifiers(Modifiers::public().with_static()),
            static_field(statics, "instances"),
        )
        .field(FieldDescriptor::new("value", ValueType::Long, COUNTER), slot_field("value"))
        .field(FieldDescriptor::new("label", ValueType::STRING, COUNTER), slot_field("label"))
        .field(FieldDescriptor::new("ratio", ValueType::Double, COUNTER), slot_field("ratio"))
}

fn side(target: &Value) -> Result<f64, MemberError> {
    Ok(this(target)?.slot("side").double_value()?)
}

fn shape() -> ClassDef {
    ClassDef::new(SHAPE, "demo.Shape")
        .constructor(
            vec![ValueType::Double],
            ctor(|args| Ok(Instance::new(SHAPE).with_slot("side", args[0].clone()).into_ref())),
        )
        .method(
            MethodDescriptor::new("area", vec![], ValueType::Double, SHAPE),
            method(|_, _| Ok(Value::Double(0.0))),
        )
        .method(
            MethodDescriptor::new("name", vec![], ValueType::STRING, SHAPE)
                .with_modifiers(Modifiers::public().with_final()),
            method(|_, _| Ok(Value::string("shape"))),
        )
        .method(
            MethodDescriptor::new("secret", vec![], ValueType::STRING, SHAPE).with_modifiers(Modifiers::private()),
            method(|_, _| Ok(Value::string("shape-secret"))),
        )
        .method(
            MethodDescriptor::new("perimeter", vec![], ValueType::Double, SHAPE)
                .with_modifiers(Modifiers::public().with_abstract()),
            None,
        )
        .field(FieldDescriptor::new("side", ValueType::Double, SHAPE), slot_field("side"))
}

fn square() -> ClassDef {
    let mut def = ClassDef::new(SQUARE, "demo.Square")
        .constructor(
            vec![ValueType::Double],
            ctor(|args| Ok(Instance::new(SQUARE).with_slot("side", args[0].clone()).into_ref())),
        )
        .method(
            MethodDescriptor::new("area", vec![], ValueType::Double, SQUARE),
            method(|target, _| Ok(Value::Double(side(target)?.powi(2)))),
        )
        // Shadows a final method; reachable only through resolution
        .method(
            MethodDescriptor::new("name", vec![], ValueType::STRING, SQUARE),
            method(|_, _| Ok(Value::string("square"))),
        )
        .method(
            MethodDescriptor::new("secret", vec![], ValueType::STRING, SQUARE).with_modifiers(Modifiers::private()),
            method(|_, _| Ok(Value::string("square-secret"))),
        )
        .method(
            MethodDescriptor::new("perimeter", vec![], ValueType::Double, SQUARE),
            method(|target, _| Ok(Value::Double(side(target)? * 4.0))),
        )
        .method(
            MethodDescriptor::new("display", vec![], ValueType::STRING, SQUARE),
            method(|target, _| Ok(Value::string(format!("square of side {}", side(target)?)))),
        );
    def.superclass = Some(SHAPE);
    def.interfaces = vec![NAMED];
    def
}

fn named() -> ClassDef {
    ClassDef::new(NAMED, "demo.Named").method(
        MethodDescriptor::new("display", vec![], ValueType::STRING, NAMED)
            .on_interface()
            .with_modifiers(Modifiers::public().with_abstract()),
        None,
    )
}

fn broken() -> ClassDef {
    ClassDef::new(BROKEN, "demo.Broken").method(
        MethodDescriptor::new("run", vec![], ValueType::Void, BROKEN)
            .with_modifiers(Modifiers::public().with_static()),
        None,
    )
}

fn loose() -> ClassDef {
    ClassDef::new(LOOSE, "demo.Loose")
        .method(
            MethodDescriptor::new("wide", vec![], ValueType::Int, LOOSE)
                .with_modifiers(Modifiers::public().with_static()),
            method(|_, _| Ok(Value::Long(1 << 40))),
        )
        .method(
            MethodDescriptor::new("missing", vec![], ValueType::Double, LOOSE)
                .with_modifiers(Modifiers::public().with_static()),
            method(|_, _| Ok(Value::Null)),
        )
}

fn widget() -> ClassDef {
    let mut def = ClassDef::new(WIDGET, "plugin.Widget")
        .constructor(vec![], ctor(|_| Ok(Instance::new(WIDGET).with_slot("id", Value::Int(0)).into_ref())))
        .field(FieldDescriptor::new("id", ValueType::Int, WIDGET), slot_field("id"));
    def.scope = PLUGIN_SCOPE;
    def
}
