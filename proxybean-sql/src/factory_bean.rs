//! 仓库 FactoryBean
//!
//! 每个扫描到的仓库接口对应一个 `SqlRepositoryFactoryBean`：构造参数是接口类型名，
//! `SqlClient` 通过按类型装配注入，产物由客户端按需附着。

use std::sync::Arc;

use proxybean_core::{
    BeanFactory, BeanFactoryExt, BeanObject, ConstructorArgumentValues, ContainerError,
    ContainerResult, FactoryBean, FactoryBeanClass, FactoryBeanType,
};

use crate::client::SqlClient;

pub const REPOSITORY_FACTORY_BEAN: &str = "SqlRepositoryFactoryBean";

/// 生产仓库实现的 FactoryBean
pub struct SqlRepositoryFactoryBean {
    repository_type: String,
    client: Arc<SqlClient>,
}

impl SqlRepositoryFactoryBean {
    pub fn new(repository_type: impl Into<String>, client: Arc<SqlClient>) -> Self {
        Self {
            repository_type: repository_type.into(),
            client,
        }
    }

    pub fn client(&self) -> &SqlClient {
        &self.client
    }
}

impl FactoryBean for SqlRepositoryFactoryBean {
    fn get_object(&self) -> ContainerResult<BeanObject> {
        Ok(self.client.on_demand(&self.repository_type)?)
    }

    fn object_type(&self) -> Option<&str> {
        Some(&self.repository_type)
    }
}

struct SqlRepositoryFactoryBeanType;

impl FactoryBeanType for SqlRepositoryFactoryBeanType {
    fn type_name(&self) -> &str {
        REPOSITORY_FACTORY_BEAN
    }

    fn instantiate(
        &self,
        args: &ConstructorArgumentValues,
        bean_factory: Option<&dyn BeanFactory>,
    ) -> ContainerResult<Arc<dyn FactoryBean>> {
        let repository_type = args.first().ok_or_else(|| {
            ContainerError::BeanCreationFailed(format!(
                "{} requires the repository type as its first constructor argument",
                REPOSITORY_FACTORY_BEAN
            ))
        })?;
        let bean_factory = bean_factory.ok_or_else(|| {
            ContainerError::BeanCreationFailed(format!(
                "{} for '{}' must be autowired by type",
                REPOSITORY_FACTORY_BEAN, repository_type
            ))
        })?;

        let client = bean_factory.get_bean_by_type::<SqlClient>()?;
        Ok(Arc::new(SqlRepositoryFactoryBean::new(repository_type, client)))
    }
}

/// 仓库扫描绑定的 FactoryBean 类型
pub fn repository_factory_bean() -> FactoryBeanClass {
    FactoryBeanClass::new(SqlRepositoryFactoryBeanType)
}
