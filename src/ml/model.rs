use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct BertTokenClassifierConfig {
    pub vocab_size:              usize,
    pub hidden_size:             usize,
    pub num_hidden_layers:       usize,
    pub num_attention_heads:     usize,
    pub intermediate_size:       usize,
    pub max_position_embeddings: usize,
    pub num_labels:              usize,
    #[config(default = 2)]
    pub type_vocab_size:         usize,
    #[config(default = 1e-12)]
    pub layer_norm_eps:          f64,
    #[config(default = 0.0)]
    pub dropout:                 f64,
}

impl BertTokenClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BertTokenClassifier<B> {
        let embeddings = BertEmbeddings {
            word_embeddings:       EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device),
            position_embeddings:   EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device),
            token_type_embeddings: EmbeddingConfig::new(self.type_vocab_size, self.hidden_size).init(device),
            layer_norm:            self.layer_norm(device),
            dropout:               DropoutConfig::new(self.dropout).init(),
        };
        let layers: Vec<EncoderBlock<B>> = (0..self.num_hidden_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let classifier = LinearConfig::new(self.hidden_size, self.num_labels).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        BertTokenClassifier { embeddings, layers, classifier, dropout }
    }

    fn layer_norm<B: Backend>(&self, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device)
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.hidden_size, self.num_attention_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.hidden_size, self.intermediate_size).init(device);
        let ffn_linear2 = LinearConfig::new(self.intermediate_size, self.hidden_size).init(device);
        let norm1   = self.layer_norm(device);
        let norm2   = self.layer_norm(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

/// Word + position + token-type embeddings, summed and normalised.
#[derive(Module, Debug)]
pub struct BertEmbeddings<B: Backend> {
    pub word_embeddings:       Embedding<B>,
    pub position_embeddings:   Embedding<B>,
    pub token_type_embeddings: Embedding<B>,
    pub layer_norm:            LayerNorm<B>,
    pub dropout:               Dropout,
}

impl<B: Backend> BertEmbeddings<B> {
    /// input_ids: [batch, seq_len] → [batch, seq_len, hidden]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        // Single-segment input: every token belongs to segment 0.
        let token_types = Tensor::<B, 2, Int>::zeros([batch_size, seq_len], &device);

        let x = self.word_embeddings.forward(input_ids)
            + self.position_embeddings.forward(positions)
            + self.token_type_embeddings.forward(token_types);
        self.dropout.forward(self.layer_norm.forward(x))
    }
}

/// Post-norm transformer encoder layer (BERT layout).
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct BertTokenClassifier<B: Backend> {
    pub embeddings: BertEmbeddings<B>,
    pub layers:     Vec<EncoderBlock<B>>,
    pub classifier: Linear<B>,
    pub dropout:    Dropout,
}

impl<B: Backend> BertTokenClassifier<B> {
    /// input_ids: [batch, seq_len] → logits: [batch, seq_len, num_labels]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let mut x = self.embeddings.forward(input_ids);
        for layer in &self.layers {
            x = layer.forward(x);
        }
        self.classifier.forward(self.dropout.forward(x))
    }

    /// Longest sequence (special tokens included) the position table covers
    pub fn max_positions(&self) -> usize {
        self.embeddings.position_embeddings.weight.val().dims()[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny_config(num_labels: usize) -> BertTokenClassifierConfig {
        BertTokenClassifierConfig::new(32, 8, 2, 2, 16, 16, num_labels)
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = tiny_config(5).init::<TestBackend>(&device);
        let ids = Tensor::<TestBackend, 1, Int>::from_ints([1, 4, 7, 2].as_slice(), &device)
            .unsqueeze::<2>();
        let logits = model.forward(ids);
        assert_eq!(logits.dims(), [1, 4, 5]);
    }

    #[test]
    fn test_config_defaults() {
        let cfg = tiny_config(3);
        assert_eq!(cfg.type_vocab_size, 2);
        assert_eq!(cfg.layer_norm_eps, 1e-12);
        assert_eq!(cfg.dropout, 0.0);
        assert_eq!(cfg.init::<TestBackend>(&Default::default()).max_positions(), 16);
    }
}
