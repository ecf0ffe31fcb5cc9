//! Bean 作用域
//!
//! 除内置的 singleton / prototype 之外，容器可以注册任意命名的作用域处理器，
//! 例如按请求隔离实例的 `request` 作用域。

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

use crate::bean::BeanObject;
use crate::constants::{SCOPE_PROTOTYPE, SCOPE_SINGLETON};
use crate::error::{ContainerError, ContainerResult};

/// Bean 作用域
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// 单例（默认）
    #[default]
    Singleton,
    /// 每次获取创建新实例
    Prototype,
    /// 由已注册的 `ScopeHandler` 管理
    Custom(String),
}

impl Scope {
    /// 解析作用域名称，空白名称视为 singleton
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(SCOPE_SINGLETON) {
            Scope::Singleton
        } else if name.eq_ignore_ascii_case(SCOPE_PROTOTYPE) {
            Scope::Prototype
        } else {
            Scope::Custom(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Scope::Singleton => SCOPE_SINGLETON,
            Scope::Prototype => SCOPE_PROTOTYPE,
            Scope::Custom(name) => name,
        }
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self, Scope::Singleton)
    }
}

impl From<&str> for Scope {
    fn from(name: &str) -> Self {
        Scope::parse(name)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 作用域处理器
///
/// 容器在获取自定义作用域的 Bean 时委托给对应的处理器，
/// `object_factory` 只在当前作用域内还没有实例时才会被调用
pub trait ScopeHandler: Send + Sync {
    /// 获取（必要时创建）作用域内的实例
    fn get(
        &self,
        name: &str,
        object_factory: &dyn Fn() -> ContainerResult<BeanObject>,
    ) -> ContainerResult<BeanObject>;

    /// 从当前作用域移除实例
    fn remove(&self, name: &str) -> Option<BeanObject>;

    /// 当前作用域上下文的标识
    fn conversation_id(&self) -> Option<String> {
        None
    }
}

thread_local! {
    static ACTIVE_CONTEXTS: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

/// 基于上下文 ID 的作用域
///
/// 每个线程可以激活一个上下文（例如一次请求），同一上下文内的获取返回同一实例，
/// 不同上下文之间互相隔离。
pub struct ContextualScope {
    name: String,
    contexts: RwLock<HashMap<String, HashMap<String, BeanObject>>>,
}

impl ContextualScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contexts: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 在当前线程激活上下文，guard 释放时恢复之前的上下文
    pub fn activate(&self, context_id: impl Into<String>) -> ScopeContextGuard {
        let context_id = context_id.into();
        tracing::trace!("Activating {} scope context '{}'", self.name, context_id);
        let previous = ACTIVE_CONTEXTS
            .with(|active| active.borrow_mut().insert(self.name.clone(), context_id));
        ScopeContextGuard {
            scope_name: self.name.clone(),
            previous,
        }
    }

    /// 激活上下文，返回的 guard 释放时同时结束该上下文
    ///
    /// 适合一次请求对应一个上下文的场景，提前返回或出错时实例同样会被释放
    pub fn begin_context(&self, context_id: impl Into<String>) -> ScopeSession<'_> {
        let context_id = context_id.into();
        let activation = self.activate(context_id.clone());
        ScopeSession {
            scope: self,
            context_id,
            _activation: activation,
        }
    }

    /// 当前线程激活的上下文 ID
    pub fn current_context(&self) -> Option<String> {
        ACTIVE_CONTEXTS.with(|active| active.borrow().get(&self.name).cloned())
    }

    /// 结束上下文并丢弃其中的所有实例
    pub fn end_context(&self, context_id: &str) -> usize {
        let removed = self
            .contexts
            .write()
            .remove(context_id)
            .map(|instances| instances.len())
            .unwrap_or(0);
        tracing::debug!(
            "Ended {} scope context '{}', released {} instance(s)",
            self.name,
            context_id,
            removed
        );
        removed
    }

    fn require_context(&self) -> ContainerResult<String> {
        self.current_context()
            .ok_or_else(|| ContainerError::ScopeNotActive(self.name.clone()))
    }
}

impl ScopeHandler for ContextualScope {
    fn get(
        &self,
        name: &str,
        object_factory: &dyn Fn() -> ContainerResult<BeanObject>,
    ) -> ContainerResult<BeanObject> {
        let context_id = self.require_context()?;

        if let Some(existing) = self
            .contexts
            .read()
            .get(&context_id)
            .and_then(|instances| instances.get(name))
        {
            return Ok(existing.clone());
        }

        // 创建时不持锁，工厂内部可能再次访问本作用域
        let created = object_factory()?;

        let mut contexts = self.contexts.write();
        let instance = contexts
            .entry(context_id)
            .or_default()
            .entry(name.to_string())
            .or_insert(created);
        Ok(instance.clone())
    }

    fn remove(&self, name: &str) -> Option<BeanObject> {
        let context_id = self.current_context()?;
        self.contexts
            .write()
            .get_mut(&context_id)
            .and_then(|instances| instances.remove(name))
    }

    fn conversation_id(&self) -> Option<String> {
        self.current_context()
    }
}

/// 上下文激活守卫
#[must_use = "the scope context is deactivated when the guard is dropped"]
pub struct ScopeContextGuard {
    scope_name: String,
    previous: Option<String>,
}

impl Drop for ScopeContextGuard {
    fn drop(&mut self) {
        ACTIVE_CONTEXTS.with(|active| {
            let mut active = active.borrow_mut();
            match self.previous.take() {
                Some(previous) => {
                    active.insert(self.scope_name.clone(), previous);
                }
                None => {
                    active.remove(&self.scope_name);
                }
            }
        });
    }
}

/// `begin_context` 返回的会话，释放时结束上下文
#[must_use = "the scope context ends when the session is dropped"]
pub struct ScopeSession<'a> {
    scope: &'a ContextualScope,
    context_id: String,
    _activation: ScopeContextGuard,
}

impl ScopeSession<'_> {
    pub fn context_id(&self) -> &str {
        &self.context_id
    }
}

impl Drop for ScopeSession<'_> {
    fn drop(&mut self) {
        self.scope.end_context(&self.context_id);
    }
}
