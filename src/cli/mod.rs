use clap::{ Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Hub Connection Args ---
    /// Base URL of the agent hub backend
    #[arg(long, env = "HUB_URL", default_value = "http://127.0.0.1:8090")]
    pub hub_url: String,

    /// Record store backend (http, memory)
    #[arg(long, env = "STORE_TYPE", default_value = "http")]
    pub store_type: String,

    /// Login identity (email or username) for the hub
    #[arg(long, env = "HUB_IDENTITY")]
    pub identity: Option<String>,

    /// Login password for the hub
    #[arg(long, env = "HUB_PASSWORD")]
    pub password: Option<String>,

    /// Pre-issued auth token; used instead of a password login when set
    #[arg(long, env = "HUB_TOKEN")]
    pub token: Option<String>,

    // --- History Args ---
    /// Maximum number of chat messages fetched per agent when loading history
    #[arg(long, env = "HISTORY_PAGE_SIZE", default_value = "500")]
    pub page_size: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the agents visible to the authenticated user
    Agents,

    /// Create a new agent
    CreateAgent {
        /// Owning user record id
        #[arg(long)]
        user: String,
        /// Display name for the agent
        #[arg(long)]
        name: String,
    },

    /// Update an agent's configuration
    Configure {
        agent_id: String,
        /// System prompt describing the agent's character
        #[arg(long)]
        role_prompt: Option<String>,
        /// Spoken language code (e.g., en, zh)
        #[arg(long)]
        lang_code: Option<String>,
        /// Chat completion model id
        #[arg(long)]
        llm_model: Option<String>,
        /// Speech synthesis model id
        #[arg(long)]
        tts_model: Option<String>,
        /// Voice id for speech synthesis
        #[arg(long)]
        tts_voice: Option<String>,
        /// Speech recognition model id
        #[arg(long)]
        asr_model: Option<String>,
        /// Whether chat history is recorded for this agent
        #[arg(long)]
        chat_history_enabled: Option<bool>,
    },

    /// Delete an agent
    DeleteAgent {
        agent_id: String,
    },

    /// List the enabled model options of one type (asr, vad, llm, tts, mem, intent)
    Models {
        model_type: String,
    },

    /// List the devices bound to an agent
    Devices {
        agent_id: String,
    },

    /// Bind a device to an agent using the 6-digit code it displays
    Bind {
        agent_id: String,
        code: String,
    },

    /// Unbind (delete) a device
    Unbind {
        device_id: String,
    },

    /// Browse an agent's chat history grouped into conversations
    History {
        agent_id: String,
        /// Conversation id to open; defaults to the most recent
        #[arg(long)]
        conversation: Option<String>,
        /// Print resolved audio URLs next to messages that carry a recording
        #[arg(long, default_value_t = false)]
        audio: bool,
    },
}
