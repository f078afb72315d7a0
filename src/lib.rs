pub mod agents;
pub mod cli;
pub mod devices;
pub mod history;
pub mod models;
pub mod store;

use std::error::Error;

use agents::AgentManager;
use cli::{ Args, Command };
use devices::DeviceManager;
use history::ChatHistory;
use log::info;
use models::chat::Role;
use store::CHAT_HISTORY_COLLECTION;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Hub Connection ---");
    info!("Hub URL: {}", args.hub_url);
    info!("Store Backend: {}", args.store_type);
    info!("History Page Size: {}", args.page_size);
    info!("----------------------");

    let store = store::create_record_store(&args).await?;

    match &args.command {
        Command::Agents => {
            let agents = AgentManager::new(store).list().await?;
            if agents.is_empty() {
                println!("No agents found.");
                return Ok(());
            }
            for agent in &agents {
                println!("{}  {}  lang={}  history={}",
                    agent.id,
                    agent.agent_name,
                    agent.lang_code,
                    if agent.chat_history_enabled {
                        "on"
                    } else {
                        "off"
                    });
            }
        }
        Command::CreateAgent { user, name } => {
            let agent = AgentManager::new(store).create(user, name).await?;
            println!("Created agent {} ({})", agent.agent_name, agent.id);
        }
        Command::Configure {
            agent_id,
            role_prompt,
            lang_code,
            llm_model,
            tts_model,
            tts_voice,
            asr_model,
            chat_history_enabled,
        } => {
            let update = models::agent::AgentUpdate {
                role_prompt: role_prompt.clone(),
                lang_code: lang_code.clone(),
                llm_model_id: llm_model.clone(),
                tts_model_id: tts_model.clone(),
                tts_voice_id: tts_voice.clone(),
                asr_model_id: asr_model.clone(),
                chat_history_enabled: *chat_history_enabled,
                ..models::agent::AgentUpdate::default()
            };
            let agent = AgentManager::new(store).configure(agent_id, update).await?;
            println!("Updated agent {} ({})", agent.agent_name, agent.id);
        }
        Command::DeleteAgent { agent_id } => {
            AgentManager::new(store).delete(agent_id).await?;
            println!("Deleted agent {}", agent_id);
        }
        Command::Models { model_type } => {
            let configs = AgentManager::new(store).model_options(model_type).await?;
            if configs.is_empty() {
                println!("No enabled {} models found.", model_type);
                return Ok(());
            }
            for config in &configs {
                println!("{}  {}{}",
                    config.id,
                    config.model_name,
                    if config.is_default {
                        "  (default)"
                    } else {
                        ""
                    });
            }
        }
        Command::Devices { agent_id } => {
            let devices = DeviceManager::new(store).list(agent_id).await?;
            if devices.is_empty() {
                println!("No devices bound to agent {}.", agent_id);
                return Ok(());
            }
            for device in &devices {
                println!("{}  {}  board={}  last_connected={}",
                    device.id,
                    device.mac_address,
                    device.board,
                    device.last_connected);
            }
        }
        Command::Bind { agent_id, code } => {
            let receipt = DeviceManager::new(store).bind(code, agent_id).await?;
            println!("Bound device {} to agent {}", receipt.mac_address, receipt.agent_id);
        }
        Command::Unbind { device_id } => {
            DeviceManager::new(store).unbind(device_id).await?;
            println!("Unbound device {}", device_id);
        }
        Command::History { agent_id, conversation, audio } => {
            let chat_history = ChatHistory::new(store.clone(), args.page_size);
            let conversations = chat_history.conversations(agent_id).await?;

            if conversations.is_empty() {
                println!("No conversations found.");
                return Ok(());
            }

            println!("Conversations for agent {}:", agent_id);
            for conv in conversations.iter() {
                println!("  {}  {} messages  last activity {}  {}",
                    conv.id,
                    conv.messages.len(),
                    conv.last_message_time,
                    conv.preview().unwrap_or("(no text)"));
            }

            let selected = history::select_conversation(
                conversations.as_slice(),
                conversation.as_deref()
            );
            if let Some(conv) = selected {
                println!();
                println!("--- {} ---", conv.id);
                if *audio {
                    for msg in &conv.messages {
                        let role_display = match msg.role {
                            Role::User => "User",
                            Role::Assistant => "Assistant",
                        };
                        match &msg.chat_audio {
                            Some(filename) => {
                                let url = store.file_url(CHAT_HISTORY_COLLECTION, &msg.id, filename);
                                println!("{}: {}  [audio: {}]", role_display, msg.content, url);
                            }
                            None => println!("{}: {}", role_display, msg.content),
                        }
                    }
                } else {
                    print!("{}", history::render_transcript(conv));
                }
            }
        }
    }

    Ok(())
}
