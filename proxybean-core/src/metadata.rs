//! 类型元数据
//!
//! Rust 没有运行时反射，扫描依赖编译期登记的类型记录：`#[proxy_bean]`
//! 属性宏为每个被标记的类型提交一条 `TypeMetadataRecord`，扫描器通过
//! `TypeMetadataSource` 按包（模块路径）检索这些记录。

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constants::PACKAGE_INFO_NAME;
use crate::utils::naming::{package_of, simple_type_name};

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Trait,
    Struct,
    Enum,
    /// 包（模块）级说明记录
    Module,
}

/// 注解元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationMetadata {
    name: String,
    attributes: BTreeMap<String, String>,
}

impl AnnotationMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// 第一个非空白的属性值
    pub fn first_text_attribute(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.attribute(key))
            .find(|value| !value.trim().is_empty())
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// 类型元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMetadata {
    type_name: String,
    kind: TypeKind,
    independent: bool,
    annotations: Vec<AnnotationMetadata>,
}

impl TypeMetadata {
    pub fn new(type_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            independent: true,
            annotations: Vec::new(),
        }
    }

    /// trait 声明
    pub fn interface(type_name: impl Into<String>) -> Self {
        Self::new(type_name, TypeKind::Trait)
    }

    /// struct 声明
    pub fn structure(type_name: impl Into<String>) -> Self {
        Self::new(type_name, TypeKind::Struct)
    }

    /// 包说明记录
    pub fn package_info(package: &str) -> Self {
        Self::new(format!("{}::{}", package, PACKAGE_INFO_NAME), TypeKind::Module)
    }

    /// 标记为不可独立访问（例如声明在函数体内）
    ///
    /// `#[proxy_bean]` 只接受模块层级的类型，登记的记录总是可独立访问，
    /// 这里供手工构建的类型源使用
    pub fn nested(mut self) -> Self {
        self.independent = false;
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationMetadata) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn simple_name(&self) -> &str {
        simple_type_name(&self.type_name)
    }

    /// 声明所在的包
    pub fn package(&self) -> &str {
        package_of(&self.type_name)
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Trait
    }

    pub fn is_independent(&self) -> bool {
        self.independent
    }

    pub fn is_package_info(&self) -> bool {
        self.kind == TypeKind::Module || self.simple_name() == PACKAGE_INFO_NAME
    }

    pub fn annotations(&self) -> &[AnnotationMetadata] {
        &self.annotations
    }

    pub fn annotation(&self, name: &str) -> Option<&AnnotationMetadata> {
        self.annotations.iter().find(|a| a.name() == name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }

    /// 是否位于 `base_package` 或其子包内，空包名匹配一切
    pub fn is_in_package(&self, base_package: &str) -> bool {
        let base_package = base_package.trim_end_matches("::");
        if base_package.is_empty() {
            return true;
        }
        let package = self.package();
        package == base_package
            || package
                .strip_prefix(base_package)
                .is_some_and(|rest| rest.starts_with("::"))
    }
}

/// 编译期提交的注解记录
#[derive(Debug)]
pub struct AnnotationRecord {
    pub name: &'static str,
    pub attributes: &'static [(&'static str, &'static str)],
}

/// 编译期提交的类型记录
#[derive(Debug)]
pub struct TypeMetadataRecord {
    pub type_name: &'static str,
    pub kind: TypeKind,
    pub independent: bool,
    pub annotations: &'static [AnnotationRecord],
}

inventory::collect!(TypeMetadataRecord);

impl TypeMetadataRecord {
    pub fn to_metadata(&self) -> TypeMetadata {
        let mut metadata = TypeMetadata::new(self.type_name, self.kind);
        metadata.independent = self.independent;
        metadata.annotations = self
            .annotations
            .iter()
            .map(|record| {
                record
                    .attributes
                    .iter()
                    .fold(AnnotationMetadata::new(record.name), |a, (k, v)| {
                        a.with_attribute(*k, *v)
                    })
            })
            .collect();
        metadata
    }
}

/// 登记包说明记录
///
/// ```ignore
/// proxybean_core::package_info!();
/// proxybean_core::package_info!("ProxyBean");
/// ```
#[macro_export]
macro_rules! package_info {
    ($($annotation:literal),* $(,)?) => {
        $crate::inventory::submit! {
            $crate::metadata::TypeMetadataRecord {
                type_name: concat!(module_path!(), "::package_info"),
                kind: $crate::metadata::TypeKind::Module,
                independent: true,
                annotations: &[$($crate::metadata::AnnotationRecord {
                    name: $annotation,
                    attributes: &[],
                }),*],
            }
        }
    };
}

/// 类型元数据来源
pub trait TypeMetadataSource: Send + Sync {
    /// 查找 `base_package` 及其子包内声明的所有类型
    fn find_types(&self, base_package: &str) -> Vec<Arc<TypeMetadata>>;
}

/// 从 inventory 收集编译期登记的类型
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryTypeSource;

impl TypeMetadataSource for InventoryTypeSource {
    fn find_types(&self, base_package: &str) -> Vec<Arc<TypeMetadata>> {
        let mut types: Vec<Arc<TypeMetadata>> = inventory::iter::<TypeMetadataRecord>
            .into_iter()
            .map(|record| record.to_metadata())
            .filter(|metadata| metadata.is_in_package(base_package))
            .map(Arc::new)
            .collect();
        types.sort_by(|a, b| a.type_name().cmp(b.type_name()));
        types
    }
}

/// 手动维护的类型集合
#[derive(Debug, Default, Clone)]
pub struct StaticTypeSource {
    types: Vec<Arc<TypeMetadata>>,
}

impl StaticTypeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, metadata: TypeMetadata) -> Self {
        self.types.push(Arc::new(metadata));
        self
    }
}

impl TypeMetadataSource for StaticTypeSource {
    fn find_types(&self, base_package: &str) -> Vec<Arc<TypeMetadata>> {
        self.types
            .iter()
            .filter(|metadata| metadata.is_in_package(base_package))
            .cloned()
            .collect()
    }
}
