use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::FunctionDecl;
use crate::runtime::dict::Dict;
use crate::runtime::environment::Env;

pub const INITIALIZER: &str = "初期化";

/// Class descriptor shared by every instance and every copy of the class
/// value. `fields` holds default values, inherited ones first.
pub struct Class {
    pub name: String,
    pub parent: Option<Rc<Class>>,
    pub methods: FxHashMap<String, Rc<FunctionDecl>>,
    pub fields: Dict,
    pub closure: Env,
}

impl Class {
    /// Finds `name` on this class or the nearest ancestor, returning the
    /// declaration together with the class that defines it. The initializer
    /// is looked up the same way, so subclasses without one inherit it.
    pub fn find_method(self: &Rc<Self>, name: &str) -> Option<(Rc<FunctionDecl>, Rc<Class>)> {
        let mut class = Some(self);
        while let Some(current) = class {
            if let Some(decl) = current.methods.get(name) {
                return Some((Rc::clone(decl), Rc::clone(current)));
            }
            class = current.parent.as_ref();
        }
        None
    }

    pub fn initializer(self: &Rc<Self>) -> Option<(Rc<FunctionDecl>, Rc<Class>)> {
        self.find_method(INITIALIZER)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|parent| &parent.name))
            .finish()
    }
}

/// Field table plus a shared pointer to the originating class.
#[derive(Debug, Clone)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: Dict,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        let fields = class.fields.clone();
        Self { class, fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::environment::Environment;
    use crate::runtime::value::Value;

    fn decl(name: &str) -> Rc<FunctionDecl> {
        Rc::new(FunctionDecl {
            name: Some(name.to_string()),
            params: Vec::new(),
            return_type: None,
            body: Vec::new(),
            line: 1,
        })
    }

    fn class(name: &str, parent: Option<Rc<Class>>, methods: &[&str]) -> Rc<Class> {
        let mut fields = parent
            .as_ref()
            .map(|parent| parent.fields.clone())
            .unwrap_or_default();
        fields.insert(format!("{name}_field"), Value::Number(1.0));
        Rc::new(Class {
            name: name.to_string(),
            parent,
            methods: methods
                .iter()
                .map(|method| (method.to_string(), decl(method)))
                .collect(),
            fields,
            closure: Environment::global(),
        })
    }

    #[test]
    fn method_lookup_walks_parent_chain() {
        let animal = class("動物", None, &[INITIALIZER, "鳴く"]);
        let dog = class("犬", Some(Rc::clone(&animal)), &["鳴く"]);

        let (_, home) = dog.find_method("鳴く").expect("own method");
        assert!(Rc::ptr_eq(&home, &dog));
        let (_, home) = dog.initializer().expect("inherited initializer");
        assert!(Rc::ptr_eq(&home, &animal));
        assert!(dog.find_method("飛ぶ").is_none());
    }

    #[test]
    fn instances_start_from_inherited_defaults() {
        let base = class("A", None, &[]);
        let derived = class("B", Some(Rc::clone(&base)), &[]);
        let instance = Instance::new(Rc::clone(&derived));
        assert_eq!(
            instance.fields.keys().collect::<Vec<_>>(),
            vec!["A_field", "B_field"]
        );
    }
}
