//! Hello Plugin - A simple example plugin for plugmgr
//!
//! Logs each lifecycle transition and writes a greeting file into its data
//! directory on install.
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! mkdir -p lib
//! cp target/release/libhello_plugin.so lib/
//! ```
//!
//! ## Running
//!
//! ```bash
//! plugmgr run hello-plugin --link --set greeting=Howdy
//! ```

use plugmgr_api::{Plugin, PluginDefinition, PluginError, PluginParameter, export_plugin};

fn create() -> Plugin {
    let definition = PluginDefinition::new("hello", "plugmgr-team")
        .with_description("Greets the host on every lifecycle transition")
        .with_parameter(
            "greeting",
            PluginParameter::new("Greeting", "Hello")
                .with_description("Word used to greet the host")
                .with_choice("Hello", "Hello")
                .with_choice("Howdy", "Howdy"),
        )
        .with_parameter("repeat", PluginParameter::new("Repeat", 1));

    Plugin::create(definition)
        .on_install(|ctx, config| async move {
            let dir = ctx.plugin_data_dir(&config.name);
            std::fs::create_dir_all(&dir)?;
            let greeting: String = config
                .get("greeting")
                .ok_or_else(|| PluginError::custom("greeting is not a string"))?;
            std::fs::write(dir.join("greeting.txt"), format!("{greeting}, {}", ctx.host_name()))?;
            ctx.log_info(&config.name, "installed");
            Ok(())
        })
        .on_enabled(|ctx, config| async move {
            let greeting: String = config.get("greeting").unwrap_or_else(|| "Hello".into());
            let repeat: i64 = config.get("repeat").unwrap_or(1);
            for _ in 0..repeat.max(1) {
                ctx.log_info(&config.name, &format!("{greeting}, {}!", ctx.host_name()));
            }
            Ok(())
        })
        .on_disabled(|ctx, config| async move {
            ctx.log_info(&config.name, "disabled");
            Ok(())
        })
        .on_uninstall(|ctx, config| async move {
            let dir = ctx.plugin_data_dir(&config.name);
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
            ctx.log_info(&config.name, "uninstalled");
            Ok(())
        })
}

export_plugin!(create);
