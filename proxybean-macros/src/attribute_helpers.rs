use proc_macro2::TokenStream as TokenStream2;
use proc_macro_error::abort;
use syn::parse::{ParseStream, Parser};
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, Ident, Lit, LitStr, MetaNameValue, Token};

/// `#[proxy_bean(...)]` 的参数
#[derive(Default)]
pub(crate) struct ProxyBeanArgs {
    /// 自定义标记注解名，默认 `ProxyBean`
    pub marker: Option<LitStr>,
    /// 写入注解记录的属性
    pub attributes: Vec<(String, LitStr)>,
}

/// 解析标记参数
///
/// 支持格式:
/// - `#[proxy_bean]`
/// - `#[proxy_bean("request")]`（作用域简写，等价于 `value = "request"`）
/// - `#[proxy_bean(scope = "prototype", name = "users", marker = "Repository")]`
pub(crate) fn parse_proxy_bean_args(attr: TokenStream2) -> ProxyBeanArgs {
    let mut args = ProxyBeanArgs::default();
    if attr.is_empty() {
        return args;
    }

    if let Ok(scope) = syn::parse2::<LitStr>(attr.clone()) {
        args.attributes.push(("value".to_string(), scope));
        return args;
    }

    let pairs = match Punctuated::<MetaNameValue, Token![,]>::parse_terminated.parse2(attr) {
        Ok(pairs) => pairs,
        Err(err) => abort!(err.span(), "invalid #[proxy_bean] arguments: {}", err;
            help = "expected #[proxy_bean(\"scope\")] or #[proxy_bean(scope = \"..\", name = \"..\")]"),
    };

    for pair in pairs {
        let Some(key) = pair.path.get_ident().map(Ident::to_string) else {
            abort!(pair.path, "expected a plain identifier");
        };
        let value = string_literal(&pair.value);
        match key.as_str() {
            "marker" => args.marker = Some(value),
            "scope" | "value" | "name" => args.attributes.push((key, value)),
            other => abort!(
                pair.path,
                "unknown #[proxy_bean] option '{}'", other;
                help = "supported options are 'scope', 'value', 'name' and 'marker'"
            ),
        }
    }
    args
}

fn string_literal(expr: &Expr) -> LitStr {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(value) => value.clone(),
            other => abort!(other, "expected a string literal"),
        },
        other => abort!(other, "expected a string literal"),
    }
}

/// 宿主容器的作用域注解
pub(crate) struct HostScope {
    pub value: LitStr,
    pub proxy_mode: Option<LitStr>,
}

/// 取出并移除 `#[scope(...)]` 辅助属性
///
/// 支持格式: `#[scope("request")]` 或 `#[scope("request", proxy_mode = "interfaces")]`
pub(crate) fn take_host_scope(attrs: &mut Vec<Attribute>) -> Option<HostScope> {
    let index = attrs.iter().position(|attr| attr.path().is_ident("scope"))?;
    let attr = attrs.remove(index);

    let parsed = attr.parse_args_with(|input: ParseStream| {
        let value: LitStr = input.parse()?;
        let mut proxy_mode = None;
        while input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let mode: LitStr = input.parse()?;
            if key != "proxy_mode" {
                return Err(syn::Error::new(key.span(), "unknown scope option, expected 'proxy_mode'"));
            }
            proxy_mode = Some(mode);
        }
        Ok(HostScope { value, proxy_mode })
    });

    match parsed {
        Ok(scope) => Some(scope),
        Err(err) => abort!(err.span(), "invalid #[scope] attribute: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn test_empty_args() {
        let args = parse_proxy_bean_args(TokenStream2::new());
        assert!(args.marker.is_none());
        assert!(args.attributes.is_empty());
    }

    #[test]
    fn test_scope_shorthand_is_value_attribute() {
        let args = parse_proxy_bean_args(quote! { "request" });
        assert_eq!(args.attributes.len(), 1);
        assert_eq!(args.attributes[0].0, "value");
        assert_eq!(args.attributes[0].1.value(), "request");
    }

    #[test]
    fn test_named_options() {
        let args = parse_proxy_bean_args(quote! { scope = "prototype", name = "users", marker = "Repository" });
        assert_eq!(args.marker.map(|m| m.value()).as_deref(), Some("Repository"));
        let keys: Vec<&str> = args.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["scope", "name"]);
    }

    #[test]
    fn test_take_host_scope_removes_attribute() {
        let item: syn::ItemTrait = syn::parse_quote! {
            #[doc = "repo"]
            #[scope("request", proxy_mode = "interfaces")]
            trait Repo {}
        };
        let mut attrs = item.attrs;
        let scope = take_host_scope(&mut attrs).unwrap();
        assert_eq!(scope.value.value(), "request");
        assert_eq!(scope.proxy_mode.map(|m| m.value()).as_deref(), Some("interfaces"));
        assert_eq!(attrs.len(), 1);
        assert!(take_host_scope(&mut attrs).is_none());
    }
}
