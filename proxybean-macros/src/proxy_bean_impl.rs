use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use proc_macro_error::abort;
use quote::quote;
use syn::{Ident, Item};

use crate::attribute_helpers::{parse_proxy_bean_args, take_host_scope, HostScope, ProxyBeanArgs};

/// 默认的标记注解名，与 `proxybean_core::constants::DEFAULT_BEAN_ANNOTATION` 保持一致
const DEFAULT_MARKER: &str = "ProxyBean";

/// 宿主作用域注解名，与 `proxybean_core::constants::SCOPE_ANNOTATION` 保持一致
const HOST_SCOPE_ANNOTATION: &str = "Scope";

pub(crate) fn proxy_bean_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_proxy_bean_args(attr.into());
    let mut item = syn::parse_macro_input!(item as Item);

    let (ident, kind, attrs) = match &mut item {
        Item::Trait(item) => (item.ident.clone(), quote! { Trait }, &mut item.attrs),
        Item::Struct(item) => (item.ident.clone(), quote! { Struct }, &mut item.attrs),
        Item::Enum(item) => (item.ident.clone(), quote! { Enum }, &mut item.attrs),
        other => abort!(
            other,
            "#[proxy_bean] can only be applied to traits, structs or enums";
            help = "mark the repository trait itself, not its implementation"
        ),
    };

    let host_scope = take_host_scope(attrs);
    let record = type_metadata_record(&ident, kind, &args, host_scope.as_ref());
    let module_level = module_level_check(&ident);

    let expanded = quote! {
        #item

        #module_level

        #record
    };
    TokenStream::from(expanded)
}

/// 要求类型声明在模块层级
///
/// 函数体内的类型无法通过路径访问，`module_path!()` 也不包含函数名，
/// 登记的类型名会与 `type_name` 不一致。此时 `self::` 指向外层模块，导入失败。
fn module_level_check(ident: &Ident) -> TokenStream2 {
    quote! {
        #[allow(unused_imports)]
        use self::#ident as _;
    }
}

/// 生成提交给 inventory 的类型记录
fn type_metadata_record(
    ident: &Ident,
    kind: TokenStream2,
    args: &ProxyBeanArgs,
    host_scope: Option<&HostScope>,
) -> TokenStream2 {
    let type_name = ident.to_string();
    let marker = args
        .marker
        .as_ref()
        .map(|marker| marker.value())
        .unwrap_or_else(|| DEFAULT_MARKER.to_string());

    let marker_attributes = args.attributes.iter().map(|(key, value)| quote! { (#key, #value) });
    let mut annotations = vec![quote! {
        ::proxybean_core::metadata::AnnotationRecord {
            name: #marker,
            attributes: &[#(#marker_attributes),*],
        }
    }];

    if let Some(scope) = host_scope {
        let value = &scope.value;
        let proxy_mode = scope.proxy_mode.iter();
        annotations.push(quote! {
            ::proxybean_core::metadata::AnnotationRecord {
                name: #HOST_SCOPE_ANNOTATION,
                attributes: &[("value", #value) #(, ("proxyMode", #proxy_mode))*],
            }
        });
    }

    quote! {
        ::proxybean_core::inventory::submit! {
            ::proxybean_core::metadata::TypeMetadataRecord {
                type_name: concat!(module_path!(), "::", #type_name),
                kind: ::proxybean_core::metadata::TypeKind::#kind,
                independent: true,
                annotations: &[#(#annotations),*],
            }
        }
    }
}
