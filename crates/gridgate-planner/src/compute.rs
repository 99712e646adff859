//! Managed container branch: task definition, service, load balancer,
//! plus the network, routing and scaling stages.

use std::collections::BTreeMap;

use gridgate_autoscale::build_policy;
use gridgate_core::provider::env_var_for;
use gridgate_core::{
    DeploymentDescriptor, ResourceResolver, SecretRef, TopologyError, TopologyResult,
};
use gridgate_network::build_edges;
use gridgate_routing::{
    GATEWAY, GATEWAY_PORT, Listener, MIDDLEWARE_PORT, RuleSpec, compile_routes,
    default_rules, default_target_groups,
};
use gridgate_secrets::provisioner::{
    DATABASE_MIDDLEWARE_URL, DATABASE_URL, MASTER_AND_SALT, PROVIDER_API_KEYS, URL_FIELD,
};
use gridgate_secrets::{MASTER_KEY, SALT_KEY, secret_id};
use tracing::debug;

use crate::plan::{
    Cluster, ContainerSpec, LoadBalancer, ManagedContainerPlan, PolicyStatement, ServicePlan,
    SharedSubstrate, TaskDefinition,
};
use crate::substrate::resource_name;

pub const GATEWAY_CONTAINER: &str = "gateway";
pub const MIDDLEWARE_CONTAINER: &str = "middleware";
pub const HEALTH_CHECK_GRACE_SECS: u64 = 300;

const CPU_UNITS_PER_VCPU: u32 = 1024;
const MEMORY_MIB_PER_VCPU: u32 = 2048;

fn secret(stack: &str, set: &str, field: &str) -> SecretRef {
    SecretRef {
        secret_id: secret_id(stack, set),
        field: field.to_string(),
    }
}

fn statement(actions: &[&str], resources: Vec<String>) -> PolicyStatement {
    PolicyStatement {
        actions: actions.iter().map(|a| a.to_string()).collect(),
        resources,
    }
}

fn task_role(descriptor: &DeploymentDescriptor, substrate: &SharedSubstrate) -> Vec<PolicyStatement> {
    let config_arn = substrate.config_bucket.arn();
    let mut statements = vec![statement(
        &["s3:GetObject", "s3:ListBucket"],
        vec![config_arn.clone(), format!("{config_arn}/*")],
    )];
    if let Some(log_arn) = &descriptor.buckets.log_bucket_arn {
        statements.push(statement(
            &["s3:*"],
            vec![log_arn.clone(), format!("{log_arn}/*")],
        ));
    }
    statements.push(statement(&["bedrock:*"], vec!["*".to_string()]));
    statements.push(statement(&["sagemaker:InvokeEndpoint"], vec!["*".to_string()]));
    statements
}

fn gateway_container(descriptor: &DeploymentDescriptor, substrate: &SharedSubstrate) -> ContainerSpec {
    let stack = &descriptor.stack.name;

    let mut secrets = BTreeMap::from([
        ("DATABASE_URL".to_string(), secret(stack, DATABASE_URL, URL_FIELD)),
        (MASTER_KEY.to_string(), secret(stack, MASTER_AND_SALT, MASTER_KEY)),
        ("UI_PASSWORD".to_string(), secret(stack, MASTER_AND_SALT, MASTER_KEY)),
        (SALT_KEY.to_string(), secret(stack, MASTER_AND_SALT, SALT_KEY)),
    ]);
    for id in descriptor.provider_ids() {
        let var = env_var_for(&id);
        secrets.insert(var.clone(), secret(stack, PROVIDER_API_KEYS, &var));
    }

    let mut environment = BTreeMap::from([
        ("LITELLM_LOG".to_string(), "DEBUG".to_string()),
        (
            "LITELLM_CONFIG_BUCKET_NAME".to_string(),
            substrate.config_bucket.name.clone(),
        ),
        (
            "LITELLM_CONFIG_BUCKET_OBJECT_KEY".to_string(),
            substrate.config_bucket.object_key.clone(),
        ),
        ("UI_USERNAME".to_string(), "admin".to_string()),
        ("REDIS_URL".to_string(), substrate.redis_url.clone()),
        (
            "LITELLM_LOCAL_MODEL_COST_MAP".to_string(),
            if descriptor.network.disable_outbound_network_access {
                "True"
            } else {
                "False"
            }
            .to_string(),
        ),
    ]);
    let observability = &descriptor.observability;
    if let Some(project) = &observability.langsmith_project {
        environment.insert("LANGSMITH_PROJECT".to_string(), project.clone());
    }
    if let Some(run) = &observability.langsmith_default_run_name {
        environment.insert("LANGSMITH_DEFAULT_RUN_NAME".to_string(), run.clone());
    }

    ContainerSpec {
        name: GATEWAY_CONTAINER.to_string(),
        image: substrate.gateway_image.clone(),
        port: GATEWAY_PORT,
        log_stream_prefix: "LiteLLM".to_string(),
        secrets,
        environment,
    }
}

fn middleware_container(descriptor: &DeploymentDescriptor, substrate: &SharedSubstrate) -> ContainerSpec {
    let stack = &descriptor.stack.name;
    ContainerSpec {
        name: MIDDLEWARE_CONTAINER.to_string(),
        image: substrate.middleware_image.clone(),
        port: MIDDLEWARE_PORT,
        log_stream_prefix: "Middleware".to_string(),
        secrets: BTreeMap::from([
            (
                "DATABASE_MIDDLEWARE_URL".to_string(),
                secret(stack, DATABASE_MIDDLEWARE_URL, URL_FIELD),
            ),
            ("MASTER_KEY".to_string(), secret(stack, MASTER_AND_SALT, MASTER_KEY)),
        ]),
        environment: BTreeMap::from([
            ("OKTA_ISSUER".to_string(), descriptor.identity.issuer.clone()),
            ("OKTA_AUDIENCE".to_string(), descriptor.identity.audience.clone()),
        ]),
    }
}

/// Task sizing, role and containers.
pub fn task_definition(
    descriptor: &DeploymentDescriptor,
    substrate: &SharedSubstrate,
) -> TopologyResult<TaskDefinition> {
    let vcpus = descriptor.stack.vcpus;
    let size = |per_vcpu: u32| {
        vcpus.checked_mul(per_vcpu).ok_or_else(|| {
            TopologyError::configuration(format!("task size overflows for {vcpus} vCPUs"))
        })
    };
    Ok(TaskDefinition {
        family: resource_name(&descriptor.stack.name, "task"),
        cpu_units: size(CPU_UNITS_PER_VCPU)?,
        memory_mib: size(MEMORY_MIB_PER_VCPU)?,
        architecture: descriptor.architecture()?,
        os_family: "LINUX".to_string(),
        task_role: task_role(descriptor, substrate),
        containers: vec![
            gateway_container(descriptor, substrate),
            middleware_container(descriptor, substrate),
        ],
    })
}

fn rule_specs(descriptor: &DeploymentDescriptor) -> TopologyResult<Vec<RuleSpec>> {
    match &descriptor.routes {
        Some(routes) => routes.iter().map(RuleSpec::from_config).collect(),
        None => Ok(default_rules()),
    }
}

/// Build the managed container branch.
///
/// Stages run in order: network edges, routing table, scaling policy.
/// The first failing stage aborts the branch.
pub fn build_managed<R: ResourceResolver>(
    descriptor: &DeploymentDescriptor,
    substrate: &SharedSubstrate,
    resolver: &R,
) -> TopologyResult<ManagedContainerPlan> {
    let stack = &descriptor.stack;
    let compute_group = resource_name(&stack.name, "compute-sg");

    let edges = build_edges(descriptor, &compute_group, resolver)?;

    let target_groups = default_target_groups();
    let rules = compile_routes(&rule_specs(descriptor)?, &target_groups)?;
    let (alb_name, listener_name) = if stack.public {
        ("ALB-Public", "Listener-Public")
    } else {
        ("ALB-Private", "Listener-Private")
    };
    let listener = Listener::https(
        listener_name,
        &substrate.certificate_arn,
        stack.public,
        rules,
        GATEWAY,
    )?;

    let scaling = build_policy(descriptor)?;
    let task = task_definition(descriptor, substrate)?;

    let cluster = Cluster {
        name: resource_name(&stack.name, "cluster"),
        container_insights: true,
    };
    let service = ServicePlan {
        name: resource_name(&stack.name, "service"),
        cluster: cluster.name.clone(),
        desired_count: scaling.desired_capacity,
        health_check_grace_secs: HEALTH_CHECK_GRACE_SECS,
        security_group: compute_group,
    };

    debug!(
        stack = %stack.name,
        edges = edges.len(),
        rules = listener.rules.len(),
        cpu = task.cpu_units,
        memory = task.memory_mib,
        "managed container branch built"
    );

    Ok(ManagedContainerPlan {
        cluster,
        task,
        service,
        load_balancer: LoadBalancer {
            name: alb_name.to_string(),
            internet_facing: stack.public,
            domain_name: stack.domain_name.clone(),
            listener,
            firewall_acl: substrate.firewall.name.clone(),
        },
        target_groups,
        edges,
        scaling,
    })
}
