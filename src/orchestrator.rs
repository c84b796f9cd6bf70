//! Pipeline wiring: load the variable files, validate them, build the
//! inventory and emit the per-device data models.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{eyre, Result, WrapErr};
use log::{debug, error, info};
use serde::Serialize;

use crate::cli::{Args, OutputFormat};
use crate::inventory::{Device, Inventory};
use crate::services;
use crate::services::interface::ResolvedInterface;
use crate::services::route::RoutePlan;
use crate::services::tenant::{ResolvedTenant, TenantPlan};
use crate::validate::{self, FabricContext, Validation};
use crate::vars::fabric::Role;
use crate::vars::{self, AllVars};

/// Everything the templating collaborator needs to render one device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceModel {
    #[serde(flatten)]
    pub device: Device,
    pub tenants: Vec<ResolvedTenant>,
    /// Compacted trunk range of every VLAN on the device.
    pub vlan_range: String,
    pub interfaces: Vec<ResolvedInterface>,
    /// Physical ports with no fabric, MLAG or service role.
    pub unused_interfaces: Vec<String>,
    pub routing: RoutePlan,
}

pub fn run(args: &Args) -> Result<()> {
    let vars = vars::load_all(&args.vars_dir).wrap_err_with(|| {
        format!(
            "Failed to load the variable files from {}",
            args.vars_dir.display()
        )
    })?;
    info!("Loaded the variable files from {}", args.vars_dir.display());

    let ctx = FabricContext::new(&vars.base, &vars.fabric, &vars.tenant, &vars.interface)
        .map_err(|e| eyre!(e))?;

    if args.skip_validate {
        info!("Skipping input validation");
    } else if !run_validators(&vars, &ctx) {
        return Err(eyre!(
            "Input validation failed, fix the reported issues and rerun"
        ));
    }
    if args.check {
        info!("Check only run, nothing written");
        return Ok(());
    }

    let plan = services::tenant::resolve(&vars.tenant, vars.fabric.adv.mlag.peer_vlan);
    let mut models = Vec::with_capacity(ctx.inventory.devices.len());
    for dev in &ctx.inventory.devices {
        models.push(device_model(dev, &vars, &plan)?);
    }
    write_output(args, &ctx.inventory, &models)?;
    info!(
        "Wrote the inventory and {} device models to {}",
        models.len(),
        args.output_dir.display()
    );
    Ok(())
}

/// Runs the five per-file validators and logs every outcome. Returns
/// whether all of them passed.
fn run_validators(vars: &AllVars, ctx: &FabricContext) -> bool {
    let outcomes = [
        validate::base::validate(&vars.base),
        validate::fabric::validate(&vars.fabric),
        validate::tenant::validate(&vars.tenant, vars.fabric.adv.mlag.peer_vlan),
        validate::interface::validate(&vars.interface, &vars.fabric, ctx),
        validate::route::validate(&vars.route, &vars.fabric, ctx),
    ];
    let mut all_passed = true;
    for outcome in &outcomes {
        match outcome {
            Validation::Pass(msg) => info!("{msg}"),
            Validation::Fail(lines) => {
                all_passed = false;
                for line in lines {
                    error!("{line}");
                }
            }
        }
    }
    all_passed
}

fn device_model(dev: &Device, vars: &AllVars, plan: &TenantPlan) -> Result<DeviceModel> {
    let bse = &vars.fabric.adv.bse_intf;
    let (tenants, vlan_range) = match dev.role {
        Role::Leaf => (plan.leaf_tenants.clone(), plan.leaf_vlan_range.clone()),
        Role::Border => (plan.border_tenants.clone(), plan.border_vlan_range.clone()),
        Role::Spine => (Vec::new(), String::new()),
    };
    let interfaces = if dev.role.is_vtep() {
        services::interface::resolve(&vars.interface, &dev.name, bse)
    } else {
        Vec::new()
    };
    let unused_interfaces = services::interface::unused_interfaces(
        dev,
        vars.fabric.num_intf.for_role(dev.role),
        bse,
        &interfaces,
    )
    .map_err(|e| eyre!(e))?;
    let routing = services::route::resolve(&vars.route, &dev.name, &vars.fabric);
    debug!(
        "{}: {} tenants, {} service interfaces, {} unused ports",
        dev.name,
        tenants.len(),
        interfaces.len(),
        unused_interfaces.len()
    );
    Ok(DeviceModel {
        device: dev.clone(),
        tenants,
        vlan_range,
        interfaces,
        unused_interfaces,
        routing,
    })
}

fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
    };
    Ok(text)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).wrap_err_with(|| format!("Failed to write {}", path.display()))
}

fn write_output(args: &Args, inventory: &Inventory, models: &[DeviceModel]) -> Result<()> {
    let host_vars = args.output_dir.join("host_vars");
    fs::create_dir_all(&host_vars)
        .wrap_err_with(|| format!("Failed to create {}", host_vars.display()))?;

    let ext = args.format.extension();
    let inventory_path = args.output_dir.join(format!("inventory.{ext}"));
    write_file(&inventory_path, &serialize(inventory, args.format)?)?;
    for model in models {
        let path = host_vars.join(format!("{}.{ext}", model.device.name));
        write_file(&path, &serialize(model, args.format)?)?;
    }
    Ok(())
}
