mod attribute_helpers;
mod proxy_bean_impl;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;

/// ProxyBean 属性宏
///
/// 把一个 trait 标记为扫描候选：原样输出被标记的条目，同时在编译期登记一条
/// 类型元数据，扫描器据此在指定包（模块路径）中找到它。
///
/// 用法：
/// ```ignore
/// #[proxy_bean]                       // 默认作用域，Bean 名称为 userRepository
/// pub trait UserRepository: Send + Sync { }
///
/// #[proxy_bean("request")]            // 作用域简写
/// pub trait SessionRepository: Send + Sync { }
///
/// #[proxy_bean(scope = "prototype", name = "orders")]
/// pub trait OrderRepository: Send + Sync { }
///
/// #[proxy_bean(marker = "Repository")] // 自定义标记注解名
/// pub trait AuditRepository: Send + Sync { }
///
/// #[proxy_bean]
/// #[scope("request", proxy_mode = "interfaces")] // 可选：宿主容器的作用域代理
/// pub trait CartRepository: Send + Sync { }
/// ```
///
/// 被标记的条目必须声明在模块层级，声明在函数体内会导致编译错误
/// （`unresolved import self::...`）。
///
/// 使用方需要依赖 `proxybean-core`。
#[proc_macro_error]
#[proc_macro_attribute]
pub fn proxy_bean(attr: TokenStream, item: TokenStream) -> TokenStream {
    proxy_bean_impl::proxy_bean_impl(attr, item)
}
